//! SDK error types

use payql_domain::graphql::join_errors;
use payql_domain::{AuthError, DomainError, GraphqlError};
use thiserror::Error;

use crate::ports::TransportError;

/// Errors returned by the request layer.
#[derive(Debug, Clone, Error)]
pub enum SdkError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] DomainError),

    /// Token acquisition failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No valid access token could be obtained for the request.
    #[error("authentication unavailable: no valid access token could be obtained")]
    AuthenticationUnavailable,

    /// The GraphQL request did not reach the server.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The GraphQL endpoint answered with a non-success status.
    #[error("GraphQL endpoint returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The server reported GraphQL errors.
    #[error("GraphQL errors: {}", join_errors(.errors))]
    Graphql {
        /// Errors from the response envelope.
        errors: Vec<GraphqlError>,
    },

    /// The response had neither errors nor data.
    #[error("GraphQL response contained no data")]
    MissingData,

    /// The request could not be encoded or the response decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl SdkError {
    /// True for failures caused by authentication.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::AuthenticationUnavailable)
            || matches!(self, Self::Http { status: 401 | 403, .. })
    }
}

/// Result type alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
