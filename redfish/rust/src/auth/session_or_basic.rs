//! Session authentication with a Basic fallback.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::{AuthProvider, BasicAuth, SessionAuth};
use crate::connector::Connector;
use crate::errors::{RedfishError, RedfishErrorKind, RedfishResult};
use crate::transport::{BasicCredentials, HttpRequest};

/// Prefers a Redfish session and falls back to HTTP Basic authentication
/// when the service does not support sessions.
///
/// Once the fallback happens it is kept for the lifetime of the provider.
#[derive(Debug)]
pub struct SessionOrBasicAuth {
    session: SessionAuth,
    basic: BasicAuth,
    basic_fallback: AtomicBool,
}

impl SessionOrBasicAuth {
    /// Creates a new provider for the given credentials.
    pub fn new(credentials: BasicCredentials) -> Self {
        Self {
            session: SessionAuth::new(credentials.clone()),
            basic: BasicAuth::new(credentials),
            basic_fallback: AtomicBool::new(false),
        }
    }

    /// Returns true once the provider has fallen back to Basic authentication.
    pub fn uses_basic(&self) -> bool {
        self.basic_fallback.load(Ordering::SeqCst)
    }

    /// Gets the URI of the session resource, when a session is held.
    pub fn session_location(&self) -> Option<String> {
        self.session.session_location()
    }

    /// Rejected credentials and unreachable services are real failures; any
    /// other failure to create a session means sessions are unsupported.
    fn should_fall_back(error: &RedfishError) -> bool {
        !matches!(
            error.kind(),
            RedfishErrorKind::Access | RedfishErrorKind::Connection
        )
    }
}

impl AuthProvider for SessionOrBasicAuth {
    fn session_key(&self) -> Option<String> {
        if self.uses_basic() {
            None
        } else {
            self.session.session_key()
        }
    }

    fn can_refresh_session(&self) -> bool {
        !self.uses_basic() && self.session.can_refresh_session()
    }

    fn refresh_session(&self, connector: &Connector) -> RedfishResult<()> {
        if self.uses_basic() {
            return Ok(());
        }
        self.session.refresh_session(connector)
    }

    fn authenticate(&self, connector: &Connector) -> RedfishResult<()> {
        if self.uses_basic() {
            return self.basic.authenticate(connector);
        }

        match self.session.authenticate(connector) {
            Ok(()) => Ok(()),
            Err(error) if Self::should_fall_back(&error) => {
                debug!(
                    error = %error,
                    "Session authentication unavailable, falling back to basic authentication"
                );
                self.basic_fallback.store(true, Ordering::SeqCst);
                self.basic.authenticate(connector)
            }
            Err(error) => Err(error),
        }
    }

    fn apply_auth(&self, request: &mut HttpRequest) {
        if self.uses_basic() {
            self.basic.apply_auth(request);
        } else {
            self.session.apply_auth(request);
        }
    }

    fn close(&self, connector: &Connector) -> RedfishResult<()> {
        if self.uses_basic() {
            return Ok(());
        }
        self.session.close(connector)
    }
}
