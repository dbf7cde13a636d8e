//! Logging configuration and request/response logging helpers.
//!
//! Structured logging goes through `tracing`; [`LoggingConfig::init`] installs
//! a `tracing-subscriber` registry for applications that do not bring their own.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::transport::{HttpRequest, HttpResponse};

const REDACTED: &str = "[REDACTED]";

/// Bodies longer than this are truncated in log output.
const MAX_LOGGED_BODY: usize = 1024;

const SENSITIVE_HEADERS: &[&str] = &["x-auth-token", "authorization", "cookie", "set-cookie"];

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The minimum log level to capture.
    pub level: LogLevel,
    /// The output format for log messages.
    pub format: LogFormat,
    /// Whether to include the module target in log output.
    pub include_target: bool,
    /// Whether to include file and line number in log output.
    pub include_file_line: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace-level logging. Includes redacted request and response bodies.
    Trace,
    /// Debug-level logging.
    Debug,
    /// Info-level logging.
    Info,
    /// Warning-level logging.
    Warn,
    /// Error-level logging.
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors.
    Pretty,
    /// JSON lines.
    Json,
    /// Compact single-line format.
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_target: true,
            include_file_line: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a new logging configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the log format.
    ///
    /// # Examples
    ///
    /// ```
    /// use integrations_redfish::observability::{LogFormat, LoggingConfig};
    ///
    /// let config = LoggingConfig::new().with_format(LogFormat::Json);
    /// assert_eq!(config.format, LogFormat::Json);
    /// ```
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether to include the module target.
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Sets whether to include file and line number.
    pub fn with_file_line(mut self, include: bool) -> Self {
        self.include_file_line = include;
        self
    }

    /// Initialize logging with this configuration.
    ///
    /// `RUST_LOG` directives are honored on top of the configured level.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use integrations_redfish::observability::{LogLevel, LoggingConfig};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// LoggingConfig::new().with_level(LogLevel::Debug).init()?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber has already been installed.
    pub fn init(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .from_env_lossy();

        match self.format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(self.include_target)
                        .with_file(self.include_file_line)
                        .with_line_number(self.include_file_line),
                )
                .try_init()?,
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init()?,
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()?,
        }

        Ok(())
    }
}

fn password_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)("(?:password|newpassword)"\s*:\s*)"(?:[^"\\]|\\.)*""#).ok())
        .as_ref()
}

/// Returns a copy of `headers` with credential-bearing values masked.
pub fn redact_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if SENSITIVE_HEADERS
                .iter()
                .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
            {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Masks password fields in a JSON body and truncates long bodies.
pub fn redact_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match password_pattern() {
        Some(pattern) => {
            let redacted = pattern.replace_all(&text, format!("${{1}}\"{}\"", REDACTED));
            truncate(&redacted, MAX_LOGGED_BODY)
        }
        None => truncate(&text, MAX_LOGGED_BODY),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Logs an outgoing request. Headers and body are redacted.
pub fn log_request(request: &HttpRequest) {
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        basic_auth = request.basic_auth.is_some(),
        "Outgoing request"
    );
    if tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!(
            headers = ?redact_headers(&request.headers),
            body = %request.body.as_deref().map(redact_body).unwrap_or_default(),
            "Request details"
        );
    }
}

/// Logs an incoming response with the time it took.
pub fn log_response(response: &HttpResponse, elapsed: Duration) {
    tracing::debug!(
        status = response.status,
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "Incoming response"
    );
    if tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!(
            headers = ?redact_headers(&response.headers),
            body = %redact_body(&response.body),
            "Response details"
        );
    }
}
