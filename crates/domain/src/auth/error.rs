//! Authentication errors

use thiserror::Error;

/// Message fragments that mark an otherwise unclassified failure as transient.
const TRANSIENT_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "temporarily unavailable",
    "econnreset",
    "econnrefused",
    "etimedout",
];

/// Errors raised while acquiring or refreshing an access token.
///
/// The type is `Clone` because every caller joined to the same in-flight
/// refresh receives its own copy of the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The SDK is misconfigured, e.g. no token endpoint is set.
    #[error("{message}")]
    Configuration {
        /// Error description.
        message: String,
    },

    /// The token endpoint answered with a body of the wrong shape.
    #[error("Invalid token response: {message}")]
    InvalidResponse {
        /// What was wrong with the body.
        message: String,
    },

    /// The token endpoint answered with a non-success HTTP status.
    #[error("Token endpoint returned HTTP {status}: {message}")]
    TokenEndpoint {
        /// HTTP status code.
        status: u16,
        /// OAuth2 error description or raw body.
        message: String,
    },

    /// The transport failed to reach the token endpoint.
    #[error("Failed to refresh access token: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },

    /// Anything that fits none of the other buckets.
    #[error("Unexpected error while refreshing access token: {message}")]
    Unexpected {
        /// Error description.
        message: String,
        /// Whether the message looked transient.
        retryable: bool,
    },
}

impl AuthError {
    /// The error returned when a refresh is attempted without an endpoint.
    #[must_use]
    pub fn endpoint_not_configured() -> Self {
        Self::Configuration {
            message: "Token endpoint not configured: set one on the client or pass it to refresh()"
                .to_string(),
        }
    }

    /// Builds an `InvalidResponse` error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Wraps an unclassified failure, deciding retryability from its message.
    pub fn unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        let retryable = TRANSIENT_PATTERNS.iter().any(|p| lowered.contains(p));
        Self::Unexpected { message, retryable }
    }

    /// Returns true if another attempt could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration { .. } => false,
            Self::InvalidResponse { .. } | Self::Network { .. } => true,
            Self::TokenEndpoint { status, .. } => {
                matches!(*status, 408 | 429) || *status >= 500
            }
            Self::Unexpected { retryable, .. } => *retryable,
        }
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
