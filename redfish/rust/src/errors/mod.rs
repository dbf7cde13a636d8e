//! Error types for the Redfish connector.
//!
//! Every failed operation surfaces as a single [`RedfishError`] carrying a
//! [`RedfishErrorKind`] plus the request context (method, URL, status code)
//! and the most specific diagnostic text the service returned.

mod classifier;

pub use classifier::{classify, ExtendedInfo, UNKNOWN_ERROR_DETAIL};

use std::fmt;
use thiserror::Error;

use crate::transport::{HttpMethod, TransportError};

/// Result type alias for Redfish operations.
pub type RedfishResult<T> = Result<T, RedfishError>;

/// Error kinds for categorizing Redfish errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedfishErrorKind {
    /// No response was obtained (DNS, refused connection, TLS, timeout, closed connector).
    Connection,
    /// The service rejected the request as malformed (400).
    BadRequest,
    /// Authentication or authorization failed (401, 403).
    Access,
    /// The addressed resource does not exist (404).
    ResourceNotFound,
    /// The service failed internally (5xx).
    ServerSide,
    /// Any other unsuccessful HTTP status.
    Http,
    /// Invalid connector or client configuration.
    InvalidConfiguration,
    /// A request body could not be serialized.
    Serialization,
}

impl RedfishErrorKind {
    /// Maps an HTTP status code to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 | 403 => Self::Access,
            404 => Self::ResourceNotFound,
            500..=599 => Self::ServerSide,
            _ => Self::Http,
        }
    }

    /// Returns true for failures that indicate the session or credentials are no longer valid.
    pub fn is_access(&self) -> bool {
        matches!(self, Self::Access)
    }
}

impl fmt::Display for RedfishErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection_error"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Access => write!(f, "access_error"),
            Self::ResourceNotFound => write!(f, "resource_not_found"),
            Self::ServerSide => write!(f, "server_side_error"),
            Self::Http => write!(f, "http_error"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::Serialization => write!(f, "serialization_error"),
        }
    }
}

/// Redfish error with request context and extracted diagnostics.
#[derive(Error, Debug)]
pub struct RedfishError {
    kind: RedfishErrorKind,
    message: String,
    status_code: Option<u16>,
    method: Option<HttpMethod>,
    url: Option<String>,
    /// Parsed JSON error body, when the service sent one.
    body: Option<serde_json::Value>,
    detail: String,
    extended_info: Vec<ExtendedInfo>,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for RedfishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl RedfishError {
    /// Creates a new error of the given kind. The detail defaults to the message.
    pub fn new(kind: RedfishErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let detail = if message.is_empty() {
            UNKNOWN_ERROR_DETAIL.to_string()
        } else {
            message.clone()
        };
        Self {
            kind,
            message,
            status_code: None,
            method: None,
            url: None,
            body: None,
            detail,
            extended_info: Vec::new(),
            cause: None,
        }
    }

    /// Builds the error for an unsuccessful HTTP response.
    ///
    /// The message follows the kind: 404 names the missing resource, every
    /// other status reports method, URL, code and detail.
    pub(crate) fn http(
        status: u16,
        method: HttpMethod,
        url: impl Into<String>,
        body: Option<serde_json::Value>,
        detail: impl Into<String>,
        extended_info: Vec<ExtendedInfo>,
    ) -> Self {
        let kind = RedfishErrorKind::from_status(status);
        let url = url.into();
        let mut detail = detail.into();
        if detail.is_empty() {
            detail = UNKNOWN_ERROR_DETAIL.to_string();
        }
        let message = match kind {
            RedfishErrorKind::ResourceNotFound => format!("Resource {} not found", url),
            _ => format!(
                "HTTP {} {} returned code {}. {}",
                method, url, status, detail
            ),
        };
        Self {
            kind,
            message,
            status_code: Some(status),
            method: Some(method),
            url: Some(url),
            body,
            detail,
            extended_info,
            cause: None,
        }
    }

    /// Builds a connection error for a request that never produced a response.
    pub fn connection(method: HttpMethod, url: impl Into<String>, cause: TransportError) -> Self {
        let url = url.into();
        let detail = cause.to_string();
        Self {
            kind: RedfishErrorKind::Connection,
            message: format!("Unable to connect to {}. Error: {}", url, detail),
            status_code: None,
            method: Some(method),
            url: Some(url),
            body: None,
            detail,
            extended_info: Vec::new(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates an access error outside of an HTTP exchange (e.g. missing credentials).
    pub fn access(message: impl Into<String>) -> Self {
        Self::new(RedfishErrorKind::Access, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(RedfishErrorKind::InvalidConfiguration, message)
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the request method and URL.
    pub fn with_request(mut self, method: HttpMethod, url: impl Into<String>) -> Self {
        self.method = Some(method);
        self.url = Some(url.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> RedfishErrorKind {
        self.kind
    }

    /// Gets the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Gets the request method.
    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    /// Gets the request URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Gets the parsed JSON error body.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Gets the most specific human-readable diagnostic. Never empty.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Gets the `@Message.ExtendedInfo` entries of the error body.
    pub fn extended_info(&self) -> &[ExtendedInfo] {
        &self.extended_info
    }

    /// Returns true if the service rejected the credentials or session.
    pub fn is_access_error(&self) -> bool {
        self.kind.is_access()
    }
}

impl From<TransportError> for RedfishError {
    fn from(err: TransportError) -> Self {
        let message = err.to_string();
        Self::new(RedfishErrorKind::Connection, message).with_cause(err)
    }
}

impl From<serde_json::Error> for RedfishError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(
            RedfishErrorKind::Serialization,
            format!("Failed to serialize request body: {}", err),
        )
        .with_cause(err)
    }
}

impl From<url::ParseError> for RedfishError {
    fn from(err: url::ParseError) -> Self {
        Self::configuration(format!("Invalid URL: {}", err)).with_cause(err)
    }
}
