//! Redfish connector.
//!
//! The [`Connector`] performs HTTP verbs against a management endpoint,
//! injects protocol and authentication headers, classifies failures and
//! recovers once from a rejected session before giving up.

mod builder;
mod options;

pub use builder::ConnectorBuilder;
pub use options::RequestOptions;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::auth::{AuthProvider, BasicAuth, SessionAuth};
use crate::config::RedfishConfig;
use crate::errors::{classify, RedfishError, RedfishResult};
use crate::observability::{log_request, log_response};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Protocol version header name.
pub const ODATA_VERSION_HEADER: &str = "OData-Version";

/// Protocol version sent unless the caller supplies one.
pub const ODATA_VERSION: &str = "4.0";

/// Recovery cycles allowed per logical call. The replay never recovers again.
const MAX_REAUTH_ATTEMPTS: usize = 1;

/// Callback invoked with every HTTP response the connector receives.
pub type ResponseCallback = Arc<dyn Fn(&HttpResponse) + Send + Sync>;

/// Connector to a single Redfish management endpoint.
///
/// Calls block the current thread. One connector serves one caller at a time;
/// share it across threads only behind external synchronization.
///
/// # Example
///
/// ```rust,no_run
/// use integrations_redfish::{AuthMethod, Connector};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let connector = Connector::builder("https://bmc.example.com")
///         .auth(AuthMethod::session_or_basic("admin", "password"))
///         .verify_tls(false)
///         .build()?;
///
///     let systems = connector.get("/redfish/v1/Systems")?;
///     println!("{}", systems.text());
///     Ok(())
/// }
/// ```
pub struct Connector {
    base_url: String,
    base_path: String,
    default_headers: HashMap<String, String>,
    verify_tls: bool,
    sessions_path: String,
    auth: Option<Arc<dyn AuthProvider>>,
    transport: Option<Arc<dyn HttpTransport>>,
    response_callback: Option<ResponseCallback>,
    authenticating: AtomicBool,
}

/// Clears the in-progress authentication flag when dropped.
struct AuthenticationGuard<'a>(&'a AtomicBool);

impl<'a> AuthenticationGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for AuthenticationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Connector {
    /// Creates a new connector builder for the given base URL.
    pub fn builder(base_url: impl Into<String>) -> ConnectorBuilder {
        ConnectorBuilder::new(base_url)
    }

    /// Creates a new connector builder from a complete configuration.
    pub fn builder_from_config(config: RedfishConfig) -> ConnectorBuilder {
        ConnectorBuilder::from_config(config)
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Gets the session collection path.
    pub fn sessions_path(&self) -> &str {
        &self.sessions_path
    }

    /// Returns true if TLS certificates are verified.
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Gets the attached authentication provider.
    pub fn auth(&self) -> Option<&Arc<dyn AuthProvider>> {
        self.auth.as_ref()
    }

    /// Returns true once [`close`](Self::close) has released the transport.
    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    // HTTP methods

    /// Makes a GET request.
    pub fn get(&self, path: &str) -> RedfishResult<HttpResponse> {
        self.dispatch(HttpMethod::Get, path, RequestOptions::new())
    }

    /// Makes a POST request with a JSON body.
    pub fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RedfishResult<HttpResponse> {
        self.dispatch(HttpMethod::Post, path, RequestOptions::new().json(body)?)
    }

    /// Makes a PUT request with a JSON body.
    pub fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RedfishResult<HttpResponse> {
        self.dispatch(HttpMethod::Put, path, RequestOptions::new().json(body)?)
    }

    /// Makes a PATCH request with a JSON body.
    pub fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RedfishResult<HttpResponse> {
        self.dispatch(HttpMethod::Patch, path, RequestOptions::new().json(body)?)
    }

    /// Makes a DELETE request.
    pub fn delete(&self, path: &str) -> RedfishResult<HttpResponse> {
        self.dispatch(HttpMethod::Delete, path, RequestOptions::new())
    }

    /// Dispatches a request and recovers once from a rejected session.
    ///
    /// Success is any 2xx response, or a 3xx response when redirects are
    /// disabled. Anything else is classified into a [`RedfishError`]. An
    /// access error outside the session collection makes the attached
    /// provider refresh (or, failing that capability, re-authenticate) and
    /// the request is replayed exactly once. A failed recovery is returned in
    /// place of the original error.
    #[instrument(skip(self, path, options), fields(method = %method, url = tracing::field::Empty))]
    pub fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> RedfishResult<HttpResponse> {
        let url = self.resolve_url(path);
        tracing::Span::current().record("url", url.as_str());
        let mut outcome = self.attempt(method, &url, &options);

        for _ in 0..MAX_REAUTH_ATTEMPTS {
            let error = match outcome {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            let Some(auth) = self.recovery_provider(&error, path, &url) else {
                return Err(error);
            };
            self.recover(auth, &error)?;
            outcome = self.attempt(method, &url, &options);
        }

        outcome
    }

    /// Resolves a path against the base URL. Absolute URLs pass through.
    ///
    /// When the base URL has a path of its own, an absolute path that already
    /// starts with it (such as a session `Location`) is joined to the origin
    /// only, so the base path is not repeated.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with(&self.base_url) || has_http_scheme(path) {
            return path.to_string();
        }
        if path.is_empty() {
            return self.base_url.clone();
        }
        if !self.base_path.is_empty() && is_within(path, &self.base_path) {
            let origin = &self.base_url[..self.base_url.len() - self.base_path.len()];
            return format!("{}{}", origin, path);
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns true if `url` addresses the session collection or a session in it.
    ///
    /// Both the configured path and its resolution against the base URL are
    /// recognized, so a path-bearing base URL does not hide the collection.
    pub fn is_session_path(&self, url: &str) -> bool {
        let target = path_of(url);
        [
            path_of(&self.sessions_path),
            path_of(&self.resolve_url(&self.sessions_path)),
        ]
        .iter()
        .any(|marker| is_within(&target, marker))
    }

    // Session management

    /// Replaces the authentication provider.
    pub fn set_auth(&mut self, provider: Arc<dyn AuthProvider>) {
        self.auth = Some(provider);
    }

    /// Detaches the authentication provider.
    pub fn clear_auth(&mut self) {
        self.auth = None;
    }

    /// Installs HTTP Basic authentication.
    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.set_auth(Arc::new(BasicAuth::from_parts(username, password)));
    }

    /// Installs session authentication with an already issued token.
    pub fn set_session_auth(&mut self, token: impl Into<String>) {
        self.set_auth(Arc::new(SessionAuth::with_token(token)));
    }

    /// Authenticates the attached provider. No provider is a no-op.
    pub fn authenticate(&self) -> RedfishResult<()> {
        match &self.auth {
            Some(auth) => {
                let _guard = AuthenticationGuard::enter(&self.authenticating);
                auth.authenticate(self)
            }
            None => Ok(()),
        }
    }

    /// Logs out and releases the transport. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.transport.is_none() {
            return;
        }
        if let Some(auth) = self.auth.clone() {
            if let Err(error) = auth.close(self) {
                warn!(error = %error, "Failed to close Redfish session");
            }
        }
        self.transport = None;
        debug!(base_url = %self.base_url, "Connector closed");
    }

    // Internal methods

    fn attempt(
        &self,
        method: HttpMethod,
        url: &str,
        options: &RequestOptions,
    ) -> RedfishResult<HttpResponse> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| RedfishError::connection(method, url, TransportError::Closed))?;

        let request = self.build_request(method, url, options);
        log_request(&request);

        let started = Instant::now();
        let response = transport.send(request).map_err(|e| {
            debug!(error = %e, "Transport failure");
            RedfishError::connection(method, url, e)
        })?;
        log_response(&response, started.elapsed());

        if let Some(callback) = &self.response_callback {
            callback(&response);
        }

        if response.is_success() || (!options.follows_redirects() && response.is_redirect()) {
            return Ok(response);
        }

        Err(classify(response.status, &response.body, method, url))
    }

    fn build_request(&self, method: HttpMethod, url: &str, options: &RequestOptions) -> HttpRequest {
        let mut request = HttpRequest::new(method, url);
        request.headers = options.headers.clone();
        request.body = options.body.clone();
        request.allow_redirects = options.allow_redirects;
        request.timeout = options.timeout;

        for (name, value) in &self.default_headers {
            if !request.has_header(name) {
                request.headers.insert(name.clone(), value.clone());
            }
        }

        if !request.has_header(ODATA_VERSION_HEADER) {
            request
                .headers
                .insert(ODATA_VERSION_HEADER.to_string(), ODATA_VERSION.to_string());
        }

        if let Some(auth) = &self.auth {
            auth.apply_auth(&mut request);
        }

        request
    }

    fn recovery_provider(
        &self,
        error: &RedfishError,
        path: &str,
        url: &str,
    ) -> Option<&dyn AuthProvider> {
        if !error.is_access_error() {
            return None;
        }
        if self.is_session_path(path) || self.is_session_path(url) {
            debug!(url = %url, "Access denied on the session collection, not retrying");
            return None;
        }
        if self.authenticating.load(Ordering::SeqCst) {
            debug!(url = %url, "Access denied while authenticating, not retrying");
            return None;
        }
        self.auth.as_deref()
    }

    fn recover(&self, auth: &dyn AuthProvider, error: &RedfishError) -> RedfishResult<()> {
        let _guard = AuthenticationGuard::enter(&self.authenticating);
        if auth.can_refresh_session() {
            debug!(error = %error, "Session rejected, refreshing");
            auth.refresh_session(self)
        } else {
            debug!(error = %error, "Access denied, re-authenticating");
            auth.authenticate(self)
        }
    }
}

fn has_http_scheme(path: &str) -> bool {
    url::Url::parse(path)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// True if `path` equals `prefix` or continues it after a `/`. Trailing
/// slashes are ignored and an empty prefix matches nothing.
fn is_within(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    let path = path.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn path_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{}", path)
            }
        }
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("base_url", &self.base_url)
            .field("verify_tls", &self.verify_tls)
            .field("sessions_path", &self.sessions_path)
            .field("auth", &self.auth)
            .field("closed", &self.is_closed())
            .finish()
    }
}
