//! HTTP transport implementation.

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use super::TransportError;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Username/password pair carried by the transport's basic-auth mechanism.
#[derive(Clone)]
pub struct BasicCredentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: SecretString,
}

impl BasicCredentials {
    /// Creates a new credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Serialized JSON body.
    pub body: Option<Vec<u8>>,
    /// Basic credentials applied by the transport.
    pub basic_auth: Option<BasicCredentials>,
    /// Whether redirects are followed. `None` follows them.
    pub allow_redirects: Option<bool>,
    /// Request timeout override.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            basic_auth: None,
            allow_redirects: None,
            timeout: None,
        }
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns true if a header with this name is present, ignoring ASCII case.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Gets a header value, ignoring ASCII case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, one value per name.
    ///
    /// A header sent more than once keeps its first readable value, and a
    /// value that is not valid UTF-8 is left out. Both cases are logged at
    /// debug level.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the status is a redirect (3xx).
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Gets a header value, ignoring ASCII case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Parses the body as a JSON value; an empty or invalid body yields `None`.
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking HTTP transport trait.
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and wait for the response.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Verify the service's TLS certificate.
    pub verify_tls: bool,
    /// Total request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("integrations-redfish/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP transport implementation using the blocking reqwest client.
///
/// Keeps two clients so redirect handling can be chosen per request.
pub struct ReqwestTransport {
    client: Client,
    no_redirect_client: Client,
}

impl ReqwestTransport {
    /// Creates a new HTTP transport.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Self::client_builder(config)
            .build()
            .map_err(|e| TransportError::Connection {
                message: e.to_string(),
            })?;
        let no_redirect_client = Self::client_builder(config)
            .redirect(Policy::none())
            .build()
            .map_err(|e| TransportError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            no_redirect_client,
        })
    }

    fn client_builder(config: &TransportConfig) -> ClientBuilder {
        Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(4)
            .tcp_keepalive(Duration::from_secs(60))
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_connect() || err.is_request() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::InvalidResponse {
            message: err.to_string(),
        }
    }
}

impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = if request.allow_redirects == Some(false) {
            &self.no_redirect_client
        } else {
            &self.client
        };

        let mut req_builder = client.request(request.method.into(), &request.url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        if let Some(credentials) = &request.basic_auth {
            req_builder = req_builder.basic_auth(
                &credentials.username,
                Some(credentials.password.expose_secret()),
            );
        }

        if let Some(body) = request.body {
            if !request.headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
                req_builder = req_builder.header(CONTENT_TYPE, "application/json");
            }
            req_builder = req_builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder.send().map_err(|e| map_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .map_err(|e| TransportError::InvalidResponse {
                message: e.to_string(),
            })?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn collect_headers(map: &HeaderMap) -> HashMap<String, String> {
    let mut headers = HashMap::with_capacity(map.keys_len());
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            debug!(header = %name, "Dropping response header with a non UTF-8 value");
            continue;
        };
        match headers.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
            }
            Entry::Occupied(_) => {
                debug!(header = %name, "Ignoring repeated response header value");
            }
        }
    }
    headers
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}
