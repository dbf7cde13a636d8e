//! Redfish session authentication.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, instrument};

use super::{AuthProvider, SESSION_TOKEN_HEADER};
use crate::connector::Connector;
use crate::errors::{RedfishError, RedfishErrorKind, RedfishResult};
use crate::transport::{BasicCredentials, HttpMethod};

#[derive(Default)]
struct SessionState {
    key: Option<SecretString>,
    location: Option<String>,
}

/// Session-token authentication.
///
/// Logs in by creating a session resource under the connector's sessions
/// path and sends the returned `X-Auth-Token` with every request.
pub struct SessionAuth {
    credentials: Option<BasicCredentials>,
    state: RwLock<SessionState>,
}

impl SessionAuth {
    /// Creates a provider that logs in with the given credentials.
    pub fn new(credentials: BasicCredentials) -> Self {
        Self {
            credentials: Some(credentials),
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Creates a provider from a session token issued out of band.
    ///
    /// Without credentials the session cannot be re-established once the
    /// service invalidates the token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credentials: None,
            state: RwLock::new(SessionState {
                key: Some(SecretString::new(token.into())),
                location: None,
            }),
        }
    }

    /// Gets the URI of the session resource, when the service reported one.
    pub fn session_location(&self) -> Option<String> {
        self.read_state().location.clone()
    }

    /// Gets the username used to log in.
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    /// Forgets the current session without contacting the service.
    pub fn reset(&self) {
        *self.write_state() = SessionState::default();
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuthProvider for SessionAuth {
    fn session_key(&self) -> Option<String> {
        self.read_state()
            .key
            .as_ref()
            .map(|key| key.expose_secret().clone())
    }

    fn can_refresh_session(&self) -> bool {
        self.read_state().key.is_some()
    }

    fn refresh_session(&self, connector: &Connector) -> RedfishResult<()> {
        debug!("Refreshing Redfish session");
        self.authenticate(connector)
    }

    #[instrument(skip(self, connector), fields(sessions_path = %connector.sessions_path()))]
    fn authenticate(&self, connector: &Connector) -> RedfishResult<()> {
        self.reset();

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            RedfishError::access("Session authentication requires a username and password")
        })?;

        let payload = serde_json::json!({
            "UserName": credentials.username,
            "Password": credentials.password.expose_secret(),
        });
        let response = connector.post(connector.sessions_path(), &payload)?;

        let token = response
            .header(SESSION_TOKEN_HEADER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                RedfishError::new(
                    RedfishErrorKind::Http,
                    format!(
                        "Session creation succeeded but no {} header was returned",
                        SESSION_TOKEN_HEADER
                    ),
                )
                .with_status(response.status)
                .with_request(HttpMethod::Post, connector.sessions_path())
            })?;

        let location = response.header("Location").map(str::to_string);
        debug!(session = ?location, "Established Redfish session");

        *self.write_state() = SessionState {
            key: Some(SecretString::new(token.to_string())),
            location,
        };
        Ok(())
    }

    fn close(&self, connector: &Connector) -> RedfishResult<()> {
        let location = self.session_location();
        let result = match location {
            Some(location) if self.read_state().key.is_some() => {
                debug!(session = %location, "Deleting Redfish session");
                connector.delete(&location).map(|_| ())
            }
            _ => Ok(()),
        };
        self.reset();
        result
    }
}

impl fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("SessionAuth")
            .field("credentials", &self.credentials)
            .field("session_key", &state.key.as_ref().map(|_| "[REDACTED]"))
            .field("session_location", &state.location)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockResponse, MockTransport};
    use std::sync::Arc;

    fn connector(transport: &Arc<MockTransport>) -> Connector {
        Connector::builder("http://foo.bar:1234")
            .transport(transport.clone())
            .build()
            .unwrap()
    }

    fn session_created(token: &str) -> MockResponse {
        MockResponse::new(201)
            .with_header("X-Auth-Token", token)
            .with_header("Location", "/redfish/v1/SessionService/Sessions/1")
    }

    #[test]
    fn test_authenticate_stores_token_and_location() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(session_created("asdf1234"));
        let connector = connector(&transport);
        let auth = SessionAuth::new(BasicCredentials::new("admin", "password"));

        auth.authenticate(&connector).unwrap();

        assert_eq!(auth.session_key().as_deref(), Some("asdf1234"));
        assert_eq!(
            auth.session_location().as_deref(),
            Some("/redfish/v1/SessionService/Sessions/1")
        );
        assert!(auth.can_refresh_session());

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            "http://foo.bar:1234/redfish/v1/SessionService/Sessions"
        );
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body["UserName"], "admin");
        assert_eq!(body["Password"], "password");
    }

    #[test]
    fn test_authenticate_without_token_header_fails() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::new(201));
        let connector = connector(&transport);
        let auth = SessionAuth::new(BasicCredentials::new("admin", "password"));

        let error = auth.authenticate(&connector).unwrap_err();

        assert_eq!(error.kind(), RedfishErrorKind::Http);
        assert!(error.to_string().contains("X-Auth-Token"));
        assert!(auth.session_key().is_none());
    }

    #[test]
    fn test_authenticate_without_credentials_fails() {
        let transport = Arc::new(MockTransport::new());
        let connector = connector(&transport);
        let auth = SessionAuth::with_token("stale");

        let error = auth.authenticate(&connector).unwrap_err();

        assert_eq!(error.kind(), RedfishErrorKind::Access);
        assert!(auth.session_key().is_none());
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_failed_login_leaves_key_unset() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::error(401, "Invalid credentials"));
        let connector = connector(&transport);
        let auth = SessionAuth::new(BasicCredentials::new("admin", "wrong"));

        let error = auth.authenticate(&connector).unwrap_err();

        assert_eq!(error.kind(), RedfishErrorKind::Access);
        assert_eq!(error.status_code(), Some(401));
        assert!(auth.session_key().is_none());
        assert!(!auth.can_refresh_session());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_refresh_replaces_session_key() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(session_created("first"));
        transport.queue(session_created("second"));
        let mut connector = connector(&transport);
        let auth = Arc::new(SessionAuth::new(BasicCredentials::new("admin", "password")));
        connector.set_auth(auth.clone());

        auth.authenticate(&connector).unwrap();
        auth.refresh_session(&connector).unwrap();

        assert_eq!(auth.session_key().as_deref(), Some("second"));
        // The session POST never carries the stale token.
        assert!(transport.requests()[1].headers.get(SESSION_TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_close_deletes_session() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(session_created("asdf1234"));
        transport.queue(MockResponse::new(204));
        let connector = connector(&transport);
        let auth = SessionAuth::new(BasicCredentials::new("admin", "password"));
        auth.authenticate(&connector).unwrap();

        auth.close(&connector).unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(
            request.url,
            "http://foo.bar:1234/redfish/v1/SessionService/Sessions/1"
        );
        assert!(auth.session_key().is_none());
    }

    #[test]
    fn test_close_with_base_path_deletes_location() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(
            MockResponse::new(201)
                .with_header("X-Auth-Token", "asdf1234")
                .with_header("Location", "/bmc/redfish/v1/SessionService/Sessions/1"),
        );
        transport.queue(MockResponse::new(204));
        let connector = Connector::builder("http://foo.bar:1234/bmc")
            .transport(transport.clone())
            .build()
            .unwrap();
        let auth = SessionAuth::new(BasicCredentials::new("admin", "password"));
        auth.authenticate(&connector).unwrap();

        auth.close(&connector).unwrap();

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://foo.bar:1234/bmc/redfish/v1/SessionService/Sessions",
                "http://foo.bar:1234/bmc/redfish/v1/SessionService/Sessions/1",
            ]
        );
    }

    #[test]
    fn test_close_without_session_is_noop() {
        let transport = Arc::new(MockTransport::new());
        let connector = connector(&transport);
        let auth = SessionAuth::with_token("token");

        auth.close(&connector).unwrap();

        assert_eq!(transport.request_count(), 0);
        assert!(auth.session_key().is_none());
    }

    #[test]
    fn test_debug_redacts_session_key() {
        let auth = SessionAuth::with_token("super-secret-token");
        let debug_str = format!("{:?}", auth);

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret-token"));
    }
}
