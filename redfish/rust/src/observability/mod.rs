//! Observability for the Redfish connector.
//!
//! Logging is structured through `tracing`. Credentials (session tokens,
//! basic-auth headers, passwords in bodies) are redacted before they reach
//! any subscriber.

mod logging;

pub use logging::{
    log_request, log_response, redact_body, redact_headers, LogFormat, LogLevel, LoggingConfig,
};
