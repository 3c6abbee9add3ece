//! In-memory token storage with expiry tracking.
//!
//! The store holds at most one token record and answers validity questions
//! without doing any I/O. Every read goes through the injected clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use payql_domain::{TokenExpiry, TokenRecord};

use crate::ports::Clock;

/// Thread-safe holder of the current access token.
pub struct TokenStore {
    record: RwLock<Option<TokenRecord>>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            record: RwLock::new(None),
            clock,
        }
    }

    /// Current time according to the store's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// True if a token is stored and is outside the 30 second validity buffer.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let now = self.now();
        self.record
            .read()
            .as_ref()
            .is_some_and(|record| record.is_valid_at(now))
    }

    /// The token string, only while it is valid.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        let now = self.now();
        self.record
            .read()
            .as_ref()
            .filter(|record| record.is_valid_at(now))
            .map(|record| record.access_token.clone())
    }

    /// `"{token_type} {token}"`, only while the token is valid.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        let now = self.now();
        self.record
            .read()
            .as_ref()
            .filter(|record| record.is_valid_at(now))
            .map(TokenRecord::authorization_header)
    }

    /// Time left until the real expiry; zero when empty or expired.
    #[must_use]
    pub fn time_until_expiration(&self) -> Duration {
        let now = self.now();
        self.record
            .read()
            .as_ref()
            .map_or(Duration::ZERO, |record| record.remaining_at(now))
    }

    /// Expiry timestamp of the stored token, valid or not.
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.record.read().as_ref().map(|record| record.expires_at)
    }

    /// True when empty or within five minutes of expiry.
    #[must_use]
    pub fn should_refresh(&self) -> bool {
        let now = self.now();
        self.record
            .read()
            .as_ref()
            .is_none_or(|record| record.should_refresh_at(now))
    }

    /// Stores a token, replacing any previous record as a whole.
    pub fn set(
        &self,
        access_token: impl Into<String>,
        expiry: TokenExpiry,
        token_type: Option<&str>,
    ) {
        let record = TokenRecord::new(access_token, expiry, token_type, self.now());
        self.replace(record);
    }

    /// Swaps in a fully built record.
    pub fn replace(&self, record: TokenRecord) {
        *self.record.write() = Some(record);
    }

    /// Discards the stored token.
    pub fn clear(&self) {
        *self.record.write() = None;
    }

    /// Copy of the stored record, valid or not.
    #[must_use]
    pub fn snapshot(&self) -> Option<TokenRecord> {
        self.record.read().clone()
    }

    /// Token status for display.
    #[must_use]
    pub fn status(&self) -> TokenStatus {
        let now = self.now();
        self.record
            .read()
            .as_ref()
            .map_or(TokenStatus::NotAuthenticated, |record| {
                let remaining = record.remaining_at(now);
                if !record.is_valid_at(now) {
                    TokenStatus::Expired
                } else if record.should_refresh_at(now) {
                    TokenStatus::Expiring { remaining }
                } else {
                    TokenStatus::Valid { remaining }
                }
            })
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Status of the stored token for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token is stored.
    NotAuthenticated,
    /// Token is valid and not due for refresh.
    Valid {
        /// Time until expiry.
        remaining: Duration,
    },
    /// Token is valid but inside the proactive refresh window.
    Expiring {
        /// Time until expiry.
        remaining: Duration,
    },
    /// Token is expired or inside the validity buffer.
    Expired,
}

impl TokenStatus {
    /// Returns true if the token can still be used.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid { remaining } => {
                let secs = remaining.as_secs();
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring { remaining } => {
                format!("Expiring in {} seconds (will refresh)", remaining.as_secs())
            }
            Self::Expired => "Expired".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;
    use pretty_assertions::assert_eq;

    fn store() -> (TokenStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TokenStore::new(clock.clone()), clock)
    }

    #[test]
    fn test_empty_store() {
        let (store, _) = store();
        assert!(!store.is_valid());
        assert_eq!(store.token(), None);
        assert_eq!(store.authorization_header(), None);
        assert_eq!(store.time_until_expiration(), Duration::ZERO);
        assert!(store.should_refresh());
        assert_eq!(store.status(), TokenStatus::NotAuthenticated);
    }

    #[test]
    fn test_validity_buffer() {
        let (store, _) = store();
        store.set("tok", TokenExpiry::TtlSeconds(29), None);
        assert!(!store.is_valid());
        assert_eq!(store.token(), None);

        store.set("tok", TokenExpiry::TtlSeconds(31), None);
        assert!(store.is_valid());
        assert_eq!(store.token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_token_expires_as_clock_advances() {
        let (store, clock) = store();
        store.set("tok", TokenExpiry::TtlSeconds(120), Some("Bearer"));
        assert_eq!(store.authorization_header().as_deref(), Some("Bearer tok"));

        clock.advance(Duration::from_secs(89));
        assert!(store.is_valid());

        clock.advance(Duration::from_secs(1));
        assert!(!store.is_valid());
        assert_eq!(store.authorization_header(), None);
        assert_eq!(store.time_until_expiration(), Duration::from_secs(30));
        assert_eq!(store.status(), TokenStatus::Expired);
    }

    #[test]
    fn test_should_refresh_threshold() {
        let (store, _) = store();
        store.set("tok", TokenExpiry::TtlSeconds(4 * 60), None);
        assert!(store.should_refresh());
        assert!(store.status().is_valid());

        store.set("tok", TokenExpiry::TtlSeconds(10 * 60), None);
        assert!(!store.should_refresh());
    }

    #[test]
    fn test_set_with_absolute_expiry_and_default() {
        let (store, clock) = store();
        let at = clock.now() + chrono::Duration::minutes(20);
        store.set("abs", TokenExpiry::ExpiresAt(at), Some("MAC"));
        assert_eq!(store.expiration(), Some(at));
        assert_eq!(store.authorization_header().as_deref(), Some("MAC abs"));

        store.set("dflt", TokenExpiry::Default, None);
        assert_eq!(store.time_until_expiration(), Duration::from_secs(3600));
        let record = store.snapshot().unwrap();
        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.access_token, "dflt");
    }

    #[test]
    fn test_clear() {
        let (store, _) = store();
        store.set("tok", TokenExpiry::Default, None);
        store.clear();
        assert_eq!(store.snapshot(), None);
        assert_eq!(store.expiration(), None);
    }

    #[test]
    fn test_status_display_messages() {
        assert_eq!(
            TokenStatus::NotAuthenticated.display_message(),
            "Not authenticated"
        );
        assert!(
            TokenStatus::Valid {
                remaining: Duration::from_secs(7200)
            }
            .display_message()
            .contains("hours")
        );
        assert!(
            TokenStatus::Expiring {
                remaining: Duration::from_secs(30)
            }
            .display_message()
            .contains("will refresh")
        );
    }
}
