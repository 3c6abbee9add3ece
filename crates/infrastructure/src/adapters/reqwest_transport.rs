//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port using the reqwest library.
//! Both the token endpoint and the GraphQL endpoint are reached through it.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use payql_application::ports::{HttpResponse, HttpTransport, PostOptions, TransportError};
use reqwest::{Client, Url};
use tracing::debug;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("payql/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new transport with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: none
    /// - TLS verification: enabled
    /// - User-Agent: "payql/<version>"
    ///
    /// Timeouts are applied per request from [`PostOptions`].
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a transport around a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();
            return TransportError::Connection(format!("{host}: {error}"));
        }

        if error.is_builder() {
            return TransportError::InvalidRequest(error.to_string());
        }

        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        options: &PostOptions,
    ) -> Result<HttpResponse, TransportError> {
        let parsed_url =
            Url::parse(url).map_err(|e| TransportError::InvalidRequest(format!("{e}: {url}")))?;
        let timeout_ms = u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX);

        let start = Instant::now();

        let mut builder = self
            .client
            .post(parsed_url)
            .timeout(options.timeout)
            .body(body);
        for (name, value) in &options.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();

        // Header names are lowercased by reqwest.
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        debug!(
            url,
            status,
            elapsed_ms = start.elapsed().as_millis(),
            "HTTP POST completed"
        );

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_creation() {
        let transport = ReqwestTransport::new();
        assert!(transport.is_ok());
    }

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("payql/"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let transport = ReqwestTransport::new().unwrap();
        let options = PostOptions::new(Duration::from_secs(1));

        let err = transport
            .post("not a url", Vec::new(), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
