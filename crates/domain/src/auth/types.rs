//! Access token types and token endpoint payloads

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AuthError;

/// Token type used when the server does not send one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Lifetime assumed for a token whose expiry is unknown.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// A token stops being valid this many seconds before its real expiry.
pub const VALIDITY_BUFFER_SECS: i64 = 30;

/// A token is due for proactive refresh once this many seconds remain.
pub const REFRESH_THRESHOLD_SECS: i64 = 5 * 60;

/// Where a manually set token gets its expiry from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// Lifetime in seconds, counted from the moment the token is stored.
    TtlSeconds(u64),
    /// Absolute expiry timestamp.
    ExpiresAt(DateTime<Utc>),
    /// No expiry information: the default one-hour lifetime applies.
    Default,
}

impl TokenExpiry {
    /// Resolves this source into an absolute expiry relative to `now`.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = match self {
            Self::ExpiresAt(at) => return at,
            Self::TtlSeconds(secs) => secs,
            Self::Default => DEFAULT_TOKEN_LIFETIME_SECS,
        };
        i64::try_from(ttl)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// The single access token held by a token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The access token string.
    pub access_token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Token type, usually "Bearer".
    pub token_type: String,
}

impl TokenRecord {
    /// Builds a record accepted at `now`.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        expiry: TokenExpiry,
        token_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: expiry.resolve(now),
            token_type: token_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(DEFAULT_TOKEN_TYPE)
                .to_string(),
        }
    }

    /// True while `now` is before the expiry minus the validity buffer.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(VALIDITY_BUFFER_SECS) < self.expires_at
    }

    /// Time left until the real expiry, never negative.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.expires_at - now).to_std().unwrap_or_default()
    }

    /// True once the remaining lifetime drops to the refresh threshold.
    #[must_use]
    pub fn should_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::seconds(REFRESH_THRESHOLD_SECS)
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Short, log-safe preview of the token.
    #[must_use]
    pub fn preview(&self) -> String {
        token_preview(&self.access_token)
    }
}

/// First 8 characters of a token followed by an ellipsis.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        "***".to_string()
    }
}

/// A validated successful response from the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,
    /// Declared token type, if any.
    pub token_type: Option<String>,
    /// Declared lifetime in seconds, always positive.
    pub expires_in: u64,
    /// Granted scope, if reported.
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Parses and validates a token endpoint body.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResponse` if the body is not a JSON object,
    /// lacks a non-empty `access_token`, or has no positive `expires_in`.
    pub fn parse(body: &[u8]) -> Result<Self, AuthError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AuthError::invalid_response(format!("body is not valid JSON ({e})")))?;

        let Value::Object(fields) = value else {
            return Err(AuthError::invalid_response("expected a JSON object"));
        };

        let access_token = fields
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::invalid_response("missing access_token"))?
            .to_string();

        let expires_in = fields
            .get("expires_in")
            .and_then(positive_seconds)
            .ok_or_else(|| AuthError::invalid_response("missing or invalid expires_in"))?;

        Ok(Self {
            access_token,
            token_type: fields
                .get("token_type")
                .and_then(Value::as_str)
                .map(String::from),
            expires_in,
            scope: fields.get("scope").and_then(Value::as_str).map(String::from),
        })
    }

    /// Converts the response into a record accepted at `now`.
    #[must_use]
    pub fn into_record(self, now: DateTime<Utc>) -> TokenRecord {
        TokenRecord::new(
            self.access_token,
            TokenExpiry::TtlSeconds(self.expires_in),
            self.token_type.as_deref(),
            now,
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn positive_seconds(value: &Value) -> Option<u64> {
    if let Some(secs) = value.as_u64() {
        return (secs > 0).then_some(secs);
    }
    value
        .as_f64()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        // Fractional lifetimes round up so a positive value never becomes zero.
        .map(|secs| secs.ceil() as u64)
}

/// OAuth2 error document returned with a failed token request.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    /// Error code, e.g. `invalid_client`.
    pub error: String,
    /// Human readable description.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenErrorResponse {
    /// Best message for display: the description if present, else the code.
    #[must_use]
    pub fn message(&self) -> String {
        self.error_description
            .clone()
            .unwrap_or_else(|| self.error.clone())
    }
}
