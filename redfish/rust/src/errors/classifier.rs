//! Classification of unsuccessful Redfish responses.
//!
//! Redfish services report failures as
//! `{"error": {"code", "message", "@Message.ExtendedInfo": [...]}}`, where the
//! extended info is sometimes sent as a bare object instead of a list.
//! Entries are read one at a time; an entry that cannot be read is skipped
//! without discarding the others.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use tracing::debug;

use super::RedfishError;
use crate::transport::HttpMethod;

/// Detail reported when the error body cannot be interpreted.
pub const UNKNOWN_ERROR_DETAIL: &str = "unknown error";

const DETAIL_SEPARATOR: &str = "; ";

/// A single `@Message.ExtendedInfo` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedInfo {
    /// Registry message identifier, e.g. `Base.1.8.MalformedJSON`.
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    /// Human-readable message.
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    /// Suggested resolution.
    #[serde(rename = "Resolution", default)]
    pub resolution: Option<String>,
    /// Severity (`OK`, `Warning`, `Critical`).
    #[serde(rename = "Severity", default)]
    pub severity: Option<String>,
    /// Substitution arguments of the registry message.
    #[serde(rename = "MessageArgs", default, deserialize_with = "null_as_default")]
    pub message_args: Vec<Value>,
    /// JSON pointers to the properties the message refers to.
    #[serde(
        rename = "RelatedProperties",
        default,
        deserialize_with = "null_as_default"
    )]
    pub related_properties: Vec<String>,
}

impl ExtendedInfo {
    /// The most useful text of this entry: the resolution, else the message.
    pub fn detail(&self) -> Option<&str> {
        non_empty(self.resolution.as_deref()).or_else(|| non_empty(self.message.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
    #[serde(rename = "@Message.ExtendedInfo", default)]
    extended_info: Option<Value>,
}

impl ErrorBody {
    fn message(&self) -> Option<&str> {
        non_empty(self.message.as_ref().and_then(Value::as_str))
    }

    /// Readable entries, from a list or a single object.
    fn extended_info(&self) -> Vec<ExtendedInfo> {
        match &self.extended_info {
            Some(Value::Array(entries)) => entries.iter().filter_map(read_entry).collect(),
            Some(entry @ Value::Object(_)) => read_entry(entry).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

fn read_entry(value: &Value) -> Option<ExtendedInfo> {
    match ExtendedInfo::deserialize(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!(error = %e, "Skipping unreadable @Message.ExtendedInfo entry");
            None
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Classifies an unsuccessful response into a [`RedfishError`].
///
/// Never fails: a body that is not JSON yields `body = None`, and a body that
/// is JSON but not a Redfish error document keeps the JSON with the detail
/// `"unknown error"`.
pub fn classify(status: u16, raw_body: &[u8], method: HttpMethod, url: &str) -> RedfishError {
    let json = match serde_json::from_slice::<serde_json::Value>(raw_body) {
        Ok(value) => value,
        Err(_) => {
            return RedfishError::http(status, method, url, None, UNKNOWN_ERROR_DETAIL, Vec::new())
        }
    };

    let envelope = match ErrorEnvelope::deserialize(&json) {
        Ok(envelope) => envelope,
        Err(_) => {
            return RedfishError::http(
                status,
                method,
                url,
                Some(json),
                UNKNOWN_ERROR_DETAIL,
                Vec::new(),
            )
        }
    };

    let extended_info = envelope.error.extended_info();
    let details: Vec<&str> = extended_info
        .iter()
        .filter_map(ExtendedInfo::detail)
        .collect();

    let detail = if details.is_empty() {
        envelope
            .error
            .message()
            .unwrap_or(UNKNOWN_ERROR_DETAIL)
            .to_string()
    } else {
        details.join(DETAIL_SEPARATOR)
    };

    RedfishError::http(status, method, url, Some(json), detail, extended_info)
}
