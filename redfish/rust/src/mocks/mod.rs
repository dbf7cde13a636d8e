//! Mock implementations for testing.
//!
//! Provides a scripted transport and auth provider for unit testing without
//! talking to a real management controller.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::AuthProvider;
use crate::connector::Connector;
use crate::errors::{RedfishError, RedfishResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates an empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        Self::new(200).with_json(value)
    }

    /// Creates a Redfish error response with a single extended-info message.
    pub fn error(status: u16, message: &str) -> Self {
        Self::new(status).with_json(&serde_json::json!({
            "error": {
                "code": "Base.1.0.GeneralError",
                "message": "A general error has occurred. See ExtendedInfo for more information.",
                "@Message.ExtendedInfo": [{
                    "MessageId": "Base.1.0.GeneralError",
                    "Message": message,
                }]
            }
        }))
    }

    /// Creates a plain text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain")
            .with_body(body.as_bytes().to_vec())
    }

    /// Sets the status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Sets a raw body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets a JSON body and content type.
    pub fn with_json<T: serde::Serialize>(self, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        self.with_header("Content-Type", "application/json")
            .with_body(body)
    }
}

impl From<MockResponse> for HttpResponse {
    fn from(response: MockResponse) -> Self {
        HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

/// Mock HTTP transport for testing.
///
/// Queued outcomes are consumed in order; once the queue is empty the default
/// response is returned, or a 500 when none is set. Every request is recorded.
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<MockResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<MockResponse>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: Mutex::new(None),
        }
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.outcomes).push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn queue_failure(&self, error: TransportError) {
        lock(&self.outcomes).push_back(Err(error));
    }

    /// Sets the response returned once the queue is empty.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Clears recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_outcome(&self) -> Result<MockResponse, TransportError> {
        if let Some(outcome) = lock(&self.outcomes).pop_front() {
            return outcome;
        }
        Ok(lock(&self.default_response)
            .clone()
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);
        self.next_outcome().map(HttpResponse::from)
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Mock auth provider for testing.
///
/// Sends its session key as `X-Auth-Token`, reports that it can refresh while
/// it holds a key, and counts every lifecycle call. Scripted failures are
/// returned once.
#[derive(Default)]
pub struct MockAuthProvider {
    session_key: Mutex<Option<String>>,
    refreshed_key: Option<String>,
    refresh_error: Mutex<Option<RedfishError>>,
    authenticate_error: Mutex<Option<RedfishError>>,
    refresh_calls: AtomicUsize,
    authenticate_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MockAuthProvider {
    /// Creates a provider without a session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the given session key.
    pub fn with_session_key(self, key: impl Into<String>) -> Self {
        *lock(&self.session_key) = Some(key.into());
        self
    }

    /// Key installed by a successful refresh or authentication.
    pub fn with_refreshed_key(mut self, key: impl Into<String>) -> Self {
        self.refreshed_key = Some(key.into());
        self
    }

    /// Makes the next refresh fail with `error` and clear the key.
    pub fn fail_refresh_with(&self, error: RedfishError) {
        *lock(&self.refresh_error) = Some(error);
    }

    /// Makes the next authentication fail with `error` and clear the key.
    pub fn fail_authenticate_with(&self, error: RedfishError) {
        *lock(&self.authenticate_error) = Some(error);
    }

    /// Number of refresh calls.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of authenticate calls.
    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    /// Number of close calls.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn renew(&self, scripted: &Mutex<Option<RedfishError>>) -> RedfishResult<()> {
        if let Some(error) = lock(scripted).take() {
            *lock(&self.session_key) = None;
            return Err(error);
        }
        if let Some(key) = &self.refreshed_key {
            *lock(&self.session_key) = Some(key.clone());
        }
        Ok(())
    }
}

impl AuthProvider for MockAuthProvider {
    fn session_key(&self) -> Option<String> {
        lock(&self.session_key).clone()
    }

    fn can_refresh_session(&self) -> bool {
        lock(&self.session_key).is_some()
    }

    fn refresh_session(&self, _connector: &Connector) -> RedfishResult<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.renew(&self.refresh_error)
    }

    fn authenticate(&self, _connector: &Connector) -> RedfishResult<()> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.renew(&self.authenticate_error)
    }

    fn close(&self, _connector: &Connector) -> RedfishResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.session_key) = None;
        Ok(())
    }
}

impl fmt::Debug for MockAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockAuthProvider")
            .field("has_session", &self.session_key().is_some())
            .field("refresh_calls", &self.refresh_calls())
            .field("authenticate_calls", &self.authenticate_calls())
            .finish()
    }
}

/// Canned Redfish payloads.
pub mod fixtures {
    use serde_json::{json, Value};

    /// Service root document.
    pub fn service_root() -> Value {
        json!({
            "@odata.id": "/redfish/v1",
            "@odata.type": "#ServiceRoot.v1_5_0.ServiceRoot",
            "Id": "RootService",
            "RedfishVersion": "1.6.0",
            "SessionService": {"@odata.id": "/redfish/v1/SessionService"},
            "Links": {"Sessions": {"@odata.id": "/redfish/v1/SessionService/Sessions"}}
        })
    }

    /// Error body carrying a single malformed-JSON extended-info message.
    pub fn malformed_json_error() -> Value {
        json!({
            "error": {
                "code": "Base.1.0.GeneralError",
                "message": "A general error has occurred. See ExtendedInfo for more information.",
                "@Message.ExtendedInfo": [{
                    "@odata.type": "#Message.v1_0_0.Message",
                    "MessageId": "Base.1.0.MalformedJSON",
                    "Message": "The request body submitted was malformed JSON and could not be parsed by the receiving service.",
                    "Severity": "Critical",
                    "Resolution": "Ensure that the request body is valid JSON and resubmit the request."
                }]
            }
        })
    }
}
