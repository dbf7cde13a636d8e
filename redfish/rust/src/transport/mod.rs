//! HTTP transport layer for the Redfish connector.
//!
//! Provides the blocking transport abstraction the connector dispatches
//! through, and its `reqwest` implementation.

mod http;

pub use http::{
    BasicCredentials, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
    TransportConfig,
};

/// Transport error types.
///
/// Every variant means no HTTP response was obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error (DNS, refused connection, TLS handshake).
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// The response could not be read.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// The connector was closed and no longer owns a transport.
    #[error("Connector is closed")]
    Closed,
}
