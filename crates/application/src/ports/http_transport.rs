//! HTTP transport port

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Options for a single POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOptions {
    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Timeout for the whole request.
    pub timeout: Duration,
}

impl PostOptions {
    /// Creates options with the given timeout and no headers.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            headers: Vec::new(),
            timeout,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (lowercase names).
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Errors reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// The connection could not be established or was lost.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for issuing HTTP POST requests.
///
/// This trait abstracts the HTTP client implementation, so the auth core and
/// the GraphQL layer never depend on a specific HTTP library.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a POST request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` when no HTTP response was received.
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        options: &PostOptions,
    ) -> Result<HttpResponse, TransportError>;
}
