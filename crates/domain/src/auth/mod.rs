//! Authentication domain types

mod credentials;
mod error;
mod types;

pub use credentials::Credentials;
pub use error::AuthError;
pub use types::{
    DEFAULT_TOKEN_LIFETIME_SECS, DEFAULT_TOKEN_TYPE, REFRESH_THRESHOLD_SECS, TokenErrorResponse,
    TokenExpiry, TokenRecord, TokenResponse, VALIDITY_BUFFER_SECS, token_preview,
};
