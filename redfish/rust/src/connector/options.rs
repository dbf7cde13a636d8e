//! Per-request options for [`Connector::dispatch`](super::Connector::dispatch).

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::RedfishResult;

/// Options for a single dispatched request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) allow_redirects: Option<bool>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates empty options: no body, no headers, redirects followed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `data` as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, data: &T) -> RedfishResult<Self> {
        self.body = Some(serde_json::to_vec(data)?);
        Ok(self)
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds several request headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Controls whether redirects are followed (default true).
    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    /// Overrides the transport timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Gets the serialized body.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Returns true when redirects are followed.
    pub fn follows_redirects(&self) -> bool {
        self.allow_redirects.unwrap_or(true)
    }
}
