//! HTTP Basic authentication.

use super::AuthProvider;
use crate::connector::Connector;
use crate::errors::RedfishResult;
use crate::transport::{BasicCredentials, HttpRequest};

/// HTTP Basic authentication.
///
/// Holds no session state; the credentials travel with every request through
/// the transport's basic-auth mechanism.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    credentials: BasicCredentials,
}

impl BasicAuth {
    /// Creates a new Basic authentication provider.
    pub fn new(credentials: BasicCredentials) -> Self {
        Self { credentials }
    }

    /// Creates a provider from a username and password.
    pub fn from_parts(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BasicCredentials::new(username, password))
    }

    /// Gets the username.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }
}

impl AuthProvider for BasicAuth {
    fn session_key(&self) -> Option<String> {
        None
    }

    fn can_refresh_session(&self) -> bool {
        false
    }

    fn refresh_session(&self, _connector: &Connector) -> RedfishResult<()> {
        Ok(())
    }

    fn authenticate(&self, _connector: &Connector) -> RedfishResult<()> {
        Ok(())
    }

    fn apply_auth(&self, request: &mut HttpRequest) {
        request.basic_auth = Some(self.credentials.clone());
    }
}
