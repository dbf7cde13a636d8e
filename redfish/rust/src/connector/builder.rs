//! Builder for [`Connector`].

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{Connector, ResponseCallback};
use crate::auth::AuthMethod;
use crate::config::{RedfishConfig, RedfishConfigBuilder};
use crate::errors::{RedfishError, RedfishResult};
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// Builder for [`Connector`].
pub struct ConnectorBuilder {
    config: RedfishConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    response_callback: Option<ResponseCallback>,
    authenticate_on_build: bool,
}

impl ConnectorBuilder {
    /// Creates a builder for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(RedfishConfigBuilder::new().base_url(base_url))
    }

    /// Creates a builder from a complete configuration.
    pub fn from_config(config: RedfishConfig) -> Self {
        Self::with_config(config.into())
    }

    fn with_config(config: RedfishConfigBuilder) -> Self {
        Self {
            config,
            transport: None,
            response_callback: None,
            authenticate_on_build: true,
        }
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.config = self.config.auth(auth);
        self
    }

    /// Uses session authentication with a Basic fallback for these credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config = self.config.credentials(username, password);
        self
    }

    /// Enables or disables TLS certificate verification.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config = self.config.verify_tls(verify);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Sets the session collection path.
    pub fn sessions_path(mut self, path: impl Into<String>) -> Self {
        self.config = self.config.sessions_path(path);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.header(name, value);
        self
    }

    /// Sets a custom transport (primarily for testing).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Registers a callback invoked with every HTTP response.
    pub fn response_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&HttpResponse) + Send + Sync + 'static,
    {
        self.response_callback = Some(Arc::new(callback));
        self
    }

    /// Controls whether `build` logs in with the configured method (default true).
    pub fn authenticate_on_build(mut self, authenticate: bool) -> Self {
        self.authenticate_on_build = authenticate;
        self
    }

    /// Builds the connector and, unless disabled, authenticates it.
    pub fn build(self) -> RedfishResult<Connector> {
        let config = self.config.build()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let transport = ReqwestTransport::new(&config.transport_config()).map_err(|e| {
                    RedfishError::configuration(format!("Failed to create HTTP client: {}", e))
                        .with_cause(e)
                })?;
                Arc::new(transport)
            }
        };

        let base_path = base_path_of(&config.base_url);
        let connector = Connector {
            base_url: config.base_url,
            base_path,
            default_headers: config.default_headers.into_iter().collect(),
            verify_tls: config.verify_tls,
            sessions_path: config.sessions_path,
            auth: config.auth.map(AuthMethod::into_provider),
            transport: Some(transport),
            response_callback: self.response_callback,
            authenticating: AtomicBool::new(false),
        };

        if self.authenticate_on_build {
            connector.authenticate()?;
        }

        debug!(
            base_url = %connector.base_url,
            auth = ?connector.auth,
            "Redfish connector ready"
        );
        Ok(connector)
    }
}

/// Path component of the base URL without a trailing slash, or empty when
/// the base URL is a bare origin.
fn base_path_of(base_url: &str) -> String {
    let path = url::Url::parse(base_url)
        .map(|parsed| parsed.path().trim_end_matches('/').to_string())
        .unwrap_or_default();
    if base_url.ends_with(&path) {
        path
    } else {
        String::new()
    }
}
