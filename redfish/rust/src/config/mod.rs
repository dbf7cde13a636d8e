//! Configuration module for the Redfish connector.
//!
//! Provides configuration management including the service URL, credentials,
//! TLS verification, timeouts and the session-creation path.

use std::fmt;
use std::time::Duration;

use crate::auth::AuthMethod;
use crate::errors::{RedfishError, RedfishResult};
use crate::transport::TransportConfig;

/// Default path of the Redfish session collection.
pub const DEFAULT_SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions";

/// Default request timeout (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a Redfish connector.
#[derive(Clone)]
pub struct RedfishConfig {
    /// Base URL of the management endpoint, without trailing slash.
    pub base_url: String,
    /// Authentication method, if any.
    pub auth: Option<AuthMethod>,
    /// Verify the service's TLS certificate.
    pub verify_tls: bool,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Path of the session collection used to create sessions.
    pub sessions_path: String,
    /// Headers sent with every request unless the caller supplies them.
    pub default_headers: Vec<(String, String)>,
    /// User agent.
    pub user_agent: String,
}

impl RedfishConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RedfishConfigBuilder {
        RedfishConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REDFISH_BASE_URL` (required): Management endpoint URL
    /// - `REDFISH_USERNAME` / `REDFISH_PASSWORD` (optional): Credentials
    /// - `REDFISH_AUTH` (optional): `session`, `basic` or `auto` (default)
    /// - `REDFISH_VERIFY_TLS` (optional): `false` or `0` disables verification
    /// - `REDFISH_TIMEOUT` (optional): Request timeout in seconds
    /// - `REDFISH_SESSIONS_PATH` (optional): Custom session collection path
    pub fn from_env() -> RedfishResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RedfishResult<Self> {
        let base_url = lookup("REDFISH_BASE_URL").ok_or_else(|| {
            RedfishError::configuration("REDFISH_BASE_URL environment variable not set")
        })?;

        let mut builder = RedfishConfigBuilder::new().base_url(base_url);

        match (lookup("REDFISH_USERNAME"), lookup("REDFISH_PASSWORD")) {
            (Some(username), Some(password)) => {
                let method = match lookup("REDFISH_AUTH").as_deref() {
                    Some("session") => AuthMethod::session(username, password),
                    Some("basic") => AuthMethod::basic(username, password),
                    Some("auto") | None => AuthMethod::session_or_basic(username, password),
                    Some(other) => {
                        return Err(RedfishError::configuration(format!(
                            "Unknown REDFISH_AUTH value '{}'",
                            other
                        )))
                    }
                };
                builder = builder.auth(method);
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(RedfishError::configuration(
                    "REDFISH_USERNAME and REDFISH_PASSWORD must be set together",
                ));
            }
            (None, None) => {}
        }

        if let Some(verify) = lookup("REDFISH_VERIFY_TLS") {
            builder = builder.verify_tls(!matches!(
                verify.to_ascii_lowercase().as_str(),
                "false" | "0" | "no"
            ));
        }

        if let Some(timeout_str) = lookup("REDFISH_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        if let Some(path) = lookup("REDFISH_SESSIONS_PATH") {
            builder = builder.sessions_path(path);
        }

        builder.build()
    }

    /// Returns the transport settings derived from this configuration.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            verify_tls: self.verify_tls,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl fmt::Debug for RedfishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedfishConfig")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.as_ref().map(AuthMethod::name))
            .field("username", &self.auth.as_ref().and_then(AuthMethod::username))
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("sessions_path", &self.sessions_path)
            .finish()
    }
}

/// Builder for `RedfishConfig`.
#[derive(Default)]
pub struct RedfishConfigBuilder {
    base_url: Option<String>,
    auth: Option<AuthMethod>,
    verify_tls: Option<bool>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    sessions_path: Option<String>,
    default_headers: Vec<(String, String)>,
    user_agent: Option<String>,
}

impl RedfishConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Uses session authentication with a Basic fallback for these credentials.
    pub fn credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(AuthMethod::session_or_basic(username, password))
    }

    /// Enables or disables TLS certificate verification.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the session collection path.
    pub fn sessions_path(mut self, path: impl Into<String>) -> Self {
        self.sessions_path = Some(path.into());
        self
    }

    /// Adds a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RedfishResult<RedfishConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| RedfishError::configuration("Base URL is required"))?
            .trim_end_matches('/')
            .to_string();

        let parsed = url::Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RedfishError::configuration(format!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if let Some(username) = self.auth.as_ref().and_then(AuthMethod::username) {
            if username.is_empty() {
                return Err(RedfishError::configuration("Username cannot be empty"));
            }
        }

        let sessions_path = self
            .sessions_path
            .unwrap_or_else(|| DEFAULT_SESSIONS_PATH.to_string());
        if sessions_path.trim().is_empty() {
            return Err(RedfishError::configuration("Sessions path cannot be empty"));
        }

        let defaults = TransportConfig::default();

        Ok(RedfishConfig {
            base_url,
            auth: self.auth,
            verify_tls: self.verify_tls.unwrap_or(true),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            sessions_path,
            default_headers: self.default_headers,
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        })
    }
}

impl From<RedfishConfig> for RedfishConfigBuilder {
    fn from(config: RedfishConfig) -> Self {
        Self {
            base_url: Some(config.base_url),
            auth: config.auth,
            verify_tls: Some(config.verify_tls),
            timeout: Some(config.timeout),
            connect_timeout: Some(config.connect_timeout),
            sessions_path: Some(config.sessions_path),
            default_headers: config.default_headers,
            user_agent: Some(config.user_agent),
        }
    }
}
