//! Authentication module for the Redfish connector.
//!
//! The connector only talks to an [`AuthProvider`]; the provider owns the
//! session key and is the only code that writes it.

mod basic;
mod session;
mod session_or_basic;

pub use basic::BasicAuth;
pub use session::SessionAuth;
pub use session_or_basic::SessionOrBasicAuth;

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

use crate::connector::Connector;
use crate::errors::RedfishResult;
use crate::transport::{BasicCredentials, HttpRequest};

/// Header carrying the Redfish session token.
pub const SESSION_TOKEN_HEADER: &str = "X-Auth-Token";

/// Authentication provider trait.
///
/// Implementations hold whatever credential state they need and expose it to
/// the connector through these operations.
pub trait AuthProvider: Send + Sync + fmt::Debug {
    /// The current session key, if a session is established.
    fn session_key(&self) -> Option<String>;

    /// True when a held session can be renewed without caller involvement.
    fn can_refresh_session(&self) -> bool;

    /// Renews the session. On failure the session key is left cleared.
    fn refresh_session(&self, connector: &Connector) -> RedfishResult<()>;

    /// Performs a full login against the connector's session-creation endpoint.
    /// On failure the session key is left unset.
    fn authenticate(&self, connector: &Connector) -> RedfishResult<()>;

    /// Applies credentials to an outgoing request.
    fn apply_auth(&self, request: &mut HttpRequest) {
        if let Some(key) = self.session_key() {
            request
                .headers
                .insert(SESSION_TOKEN_HEADER.to_string(), key);
        }
    }

    /// Releases server-side state (e.g. deletes the session).
    fn close(&self, _connector: &Connector) -> RedfishResult<()> {
        Ok(())
    }
}

/// Authentication method for a Redfish service, selected at construction time.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Session authentication with username and password.
    Session(BasicCredentials),
    /// A session token issued out of band.
    SessionToken(SecretString),
    /// HTTP Basic authentication on every request.
    Basic(BasicCredentials),
    /// Session authentication, falling back to Basic when sessions are unsupported.
    SessionOrBasic(BasicCredentials),
}

impl AuthMethod {
    /// Creates a session authentication method.
    pub fn session(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Session(BasicCredentials::new(username, password))
    }

    /// Creates a session-token authentication method.
    pub fn session_token(token: impl Into<String>) -> Self {
        Self::SessionToken(SecretString::new(token.into()))
    }

    /// Creates a Basic authentication method.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic(BasicCredentials::new(username, password))
    }

    /// Creates a session-or-basic authentication method.
    pub fn session_or_basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::SessionOrBasic(BasicCredentials::new(username, password))
    }

    /// Gets the method name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::SessionToken(_) => "session_token",
            Self::Basic(_) => "basic",
            Self::SessionOrBasic(_) => "session_or_basic",
        }
    }

    /// Gets the username, if the method carries one.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Session(c) | Self::Basic(c) | Self::SessionOrBasic(c) => Some(&c.username),
            Self::SessionToken(_) => None,
        }
    }

    /// Builds the provider for this method.
    pub fn into_provider(self) -> Arc<dyn AuthProvider> {
        match self {
            Self::Session(credentials) => Arc::new(SessionAuth::new(credentials)),
            Self::SessionToken(token) => {
                Arc::new(SessionAuth::with_token(token.expose_secret().clone()))
            }
            Self::Basic(credentials) => Arc::new(BasicAuth::new(credentials)),
            Self::SessionOrBasic(credentials) => Arc::new(SessionOrBasicAuth::new(credentials)),
        }
    }
}
