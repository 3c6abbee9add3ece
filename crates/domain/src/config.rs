//! SDK configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::Credentials;
use crate::error::{DomainError, DomainResult};

/// Default timeout for GraphQL requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed timeout for token endpoint calls.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first token request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for a payments GraphQL client.
///
/// # Example
///
/// ```
/// use payql_domain::{Credentials, SdkConfig};
///
/// let config = SdkConfig::new("https://api.example.com/graphql", Credentials::new("c1", "s1"))
///     .with_token_endpoint("https://auth.example.com/token");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// OAuth2 token endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// Client credentials.
    pub credentials: Credentials,
    /// Timeout for GraphQL requests.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    /// Timeout for token endpoint calls.
    #[serde(default = "default_auth_timeout", with = "duration_secs")]
    pub auth_timeout: Duration,
    /// Retries after the first failed token request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

const fn default_auth_timeout() -> Duration {
    DEFAULT_AUTH_TIMEOUT
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl SdkConfig {
    /// Creates a configuration with default timeouts and retries.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            endpoint: endpoint.into(),
            token_endpoint: None,
            credentials,
            timeout: DEFAULT_TIMEOUT,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(token_endpoint.into());
        self
    }

    /// Sets the GraphQL request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of token request retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Checks field presence and URL shape.
    ///
    /// A missing token endpoint is accepted here: it can be supplied later,
    /// and a refresh without one fails with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> DomainResult<()> {
        validate_url("endpoint", &self.endpoint)?;
        if let Some(token_endpoint) = &self.token_endpoint {
            validate_url("token_endpoint", token_endpoint)?;
        }
        if self.credentials.client_id.trim().is_empty() {
            return Err(DomainError::MissingField("client_id"));
        }
        if self.credentials.client_secret.trim().is_empty() {
            return Err(DomainError::MissingField("client_secret"));
        }
        if self.timeout.is_zero() {
            return Err(DomainError::InvalidValue {
                field: "timeout",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.auth_timeout.is_zero() {
            return Err(DomainError::InvalidValue {
                field: "auth_timeout",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Validates that `value` is an absolute http(s) URL.
///
/// # Errors
///
/// Returns `DomainError::MissingField` for blank input and
/// `DomainError::InvalidUrl` for anything else that is not http(s).
pub fn validate_url(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField(field));
    }
    let url = Url::parse(value).map_err(|e| DomainError::InvalidUrl {
        field,
        message: format!("{e}: {value}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DomainError::InvalidUrl {
            field,
            message: format!("unsupported scheme '{other}'"),
        }),
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
