//! Domain error types

use thiserror::Error;

/// Errors raised while validating SDK configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL for {field}: {message}")]
    InvalidUrl {
        /// Configuration field holding the URL.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// A required field is missing or blank.
    #[error("missing required configuration: {0}")]
    MissingField(&'static str),

    /// A field has a value outside its accepted range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Configuration field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
