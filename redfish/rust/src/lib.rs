//! Redfish Connector Library
//!
//! A blocking Rust connector for Redfish management controllers (BMCs).
//! It issues HTTP verbs against a service root, adds the protocol headers
//! every Redfish request needs, and turns unsuccessful responses into typed
//! errors carrying the service's `@Message.ExtendedInfo` messages.
//!
//! # Features
//!
//! - **Session authentication**: `X-Auth-Token` sessions, HTTP Basic, or
//!   sessions with an automatic Basic fallback
//! - **Transparent re-authentication**: a request rejected with 401/403 is
//!   replayed once after the session is refreshed
//! - **Error classification**: connection, bad request, access, not found,
//!   server-side and generic HTTP errors
//! - **Observability**: structured `tracing` logs with credential redaction
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use integrations_redfish::{AuthMethod, Connector, RedfishErrorKind};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connector = Connector::builder("https://10.0.0.5")
//!         .auth(AuthMethod::session("admin", "password"))
//!         .verify_tls(false)
//!         .build()?;
//!
//!     let system = connector.get("/redfish/v1/Systems/1")?;
//!     println!("{}", system.text());
//!
//!     match connector.patch("/redfish/v1/Systems/1", &json!({"AssetTag": "rack-4"})) {
//!         Ok(_) => println!("updated"),
//!         Err(e) if e.kind() == RedfishErrorKind::BadRequest => eprintln!("{}", e.detail()),
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     connector.close();
//!     Ok(())
//! }
//! ```
//!
//! # Configuration from the environment
//!
//! ```rust,no_run
//! use integrations_redfish::{Connector, RedfishConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = Connector::builder_from_config(RedfishConfig::from_env()?).build()?;
//!     connector.get("/redfish/v1")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod auth;
pub mod config;
pub mod connector;
pub mod errors;
pub mod observability;
pub mod transport;

// Re-exports for convenience
pub use auth::{AuthMethod, AuthProvider, BasicAuth, SessionAuth, SessionOrBasicAuth};
pub use config::{RedfishConfig, RedfishConfigBuilder};
pub use connector::{Connector, ConnectorBuilder, RequestOptions};
pub use errors::{ExtendedInfo, RedfishError, RedfishErrorKind, RedfishResult};
pub use transport::{HttpMethod, HttpResponse, HttpTransport, TransportError};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
