//! Authentication facade.
//!
//! `AuthManager` combines the token store and the refresh coordinator into
//! the single entry point used by the request layer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use payql_domain::config::DEFAULT_AUTH_TIMEOUT;
use payql_domain::{AuthError, Credentials, SdkConfig, TokenExpiry};
use tracing::warn;

use super::{RefreshCoordinator, RetryPolicy, TokenStatus, TokenStore};
use crate::ports::{Clock, HttpTransport};

/// Settings for [`AuthManager`] beyond the credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    /// OAuth2 token endpoint; may also be set later.
    pub token_endpoint: Option<String>,
    /// Retry policy for token requests.
    pub retry_policy: RetryPolicy,
    /// Timeout for each token request.
    pub auth_timeout: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_endpoint: None,
            retry_policy: RetryPolicy::default(),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }
}

impl AuthSettings {
    /// Settings with the given token endpoint and default policy.
    #[must_use]
    pub fn with_token_endpoint(token_endpoint: impl Into<String>) -> Self {
        Self {
            token_endpoint: Some(token_endpoint.into()),
            ..Self::default()
        }
    }
}

/// Owns the access token for one client instance.
#[derive(Debug)]
pub struct AuthManager {
    store: Arc<TokenStore>,
    coordinator: RefreshCoordinator,
}

impl AuthManager {
    /// Creates a manager with no token.
    #[must_use]
    pub fn new(
        credentials: Credentials,
        settings: AuthSettings,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(TokenStore::new(clock));
        let coordinator = RefreshCoordinator::with_policy(
            credentials,
            settings.token_endpoint,
            Arc::clone(&store),
            transport,
            settings.retry_policy,
            settings.auth_timeout,
        );
        Self { store, coordinator }
    }

    /// Creates a manager from SDK configuration.
    #[must_use]
    pub fn from_config(
        config: &SdkConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = AuthSettings {
            token_endpoint: config.token_endpoint.clone(),
            retry_policy: RetryPolicy::default().with_max_retries(config.max_retries),
            auth_timeout: config.auth_timeout,
        };
        Self::new(config.credentials.clone(), settings, transport, clock)
    }

    /// Returns a usable token, refreshing first when forced or when the
    /// stored token is missing or close to expiry.
    ///
    /// A failed refresh falls back to a still-valid stored token, if any.
    pub async fn get_valid_token(&self, force_refresh: bool) -> Option<String> {
        if (force_refresh || self.store.should_refresh())
            && let Err(err) = self.coordinator.refresh(None).await
        {
            if let Some(token) = self.store.token() {
                warn!(error = %err, "token refresh failed, using still-valid token");
                return Some(token);
            }
            warn!(error = %err, "token refresh failed and no valid token is available");
            return None;
        }
        self.store.token()
    }

    /// Runs a refresh now (or joins the running one).
    ///
    /// # Errors
    ///
    /// Propagates the coordinator's final `AuthError`.
    pub async fn refresh(&self, endpoint_override: Option<&str>) -> Result<(), AuthError> {
        self.coordinator.refresh(endpoint_override).await
    }

    /// True if a token is stored and outside the validity buffer.
    #[must_use]
    pub fn is_token_valid(&self) -> bool {
        self.store.is_valid()
    }

    /// The stored token, only while valid.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    /// Discards the stored token.
    pub fn clear_token(&self) {
        self.store.clear();
    }

    /// Stores a token manually.
    pub fn set_token(
        &self,
        access_token: impl Into<String>,
        expiry: TokenExpiry,
        token_type: Option<&str>,
    ) {
        self.store.set(access_token, expiry, token_type);
    }

    /// Stores a token that lives `ttl_secs` seconds from now.
    pub fn set_token_with_ttl(&self, access_token: impl Into<String>, ttl_secs: u64) {
        self.set_token(access_token, TokenExpiry::TtlSeconds(ttl_secs), None);
    }

    /// Stores a token with an absolute expiry.
    pub fn set_token_with_expiry(
        &self,
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) {
        self.set_token(access_token, TokenExpiry::ExpiresAt(expires_at), None);
    }

    /// Stores a token with the default one-hour lifetime.
    pub fn set_token_no_expiry(&self, access_token: impl Into<String>) {
        self.set_token(access_token, TokenExpiry::Default, None);
    }

    /// Expiry of the stored token.
    #[must_use]
    pub fn token_expiration(&self) -> Option<DateTime<Utc>> {
        self.store.expiration()
    }

    /// Time left until the stored token expires.
    #[must_use]
    pub fn time_until_expiration(&self) -> Duration {
        self.store.time_until_expiration()
    }

    /// True when the token is missing or due for proactive refresh.
    #[must_use]
    pub fn should_refresh_token(&self) -> bool {
        self.store.should_refresh()
    }

    /// `Authorization` header value, only while the token is valid.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.store.authorization_header()
    }

    /// The configured token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> Option<String> {
        self.coordinator.token_endpoint()
    }

    /// Replaces the configured token endpoint.
    pub fn set_token_endpoint(&self, token_endpoint: impl Into<String>) {
        self.coordinator.set_token_endpoint(Some(token_endpoint.into()));
    }

    /// Copy of the client credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        self.coordinator.credentials()
    }

    /// Token status for display.
    #[must_use]
    pub fn status(&self) -> TokenStatus {
        self.store.status()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{HttpResponse, TransportError};
    use crate::testing::{ManualClock, ScriptedTransport, token_body};
    use futures_util::poll;
    use pretty_assertions::assert_eq;
    use std::pin::pin;

    const ENDPOINT: &str = "https://auth.example/token";

    fn manager(transport: &Arc<ScriptedTransport>) -> (AuthManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let manager = AuthManager::new(
            Credentials::new("c1", "s1"),
            AuthSettings::with_token_endpoint(ENDPOINT),
            transport.clone(),
            clock.clone(),
        );
        (manager, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_valid_token_fetches_when_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(200, token_body("tok-A", 3600));
        let (manager, _) = manager(&transport);

        assert_eq!(manager.get_valid_token(false).await.as_deref(), Some("tok-A"));
        assert_eq!(manager.authorization_header().as_deref(), Some("Bearer tok-A"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_valid_token_reuses_fresh_token() {
        let transport = Arc::new(ScriptedTransport::new());
        let (manager, _) = manager(&transport);
        manager.set_token_with_ttl("cached", 3600);

        assert_eq!(manager.get_valid_token(false).await.as_deref(), Some("cached"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_valid_token_refreshes_expiring_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(200, token_body("tok-new", 3600));
        let (manager, clock) = manager(&transport);
        manager.set_token_with_ttl("tok-old", 3600);

        clock.advance(Duration::from_secs(3600 - 4 * 60));
        assert!(manager.should_refresh_token());
        assert!(manager.is_token_valid());

        assert_eq!(manager.get_valid_token(false).await.as_deref(), Some("tok-new"));
        assert!(!manager.should_refresh_token());
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_refresh_failure_fails_closed() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_fallback(Err(TransportError::Connection("refused".to_string()))),
        );
        let (manager, _) = manager(&transport);
        manager.set_token_with_ttl("still-good", 3600);

        assert_eq!(manager.get_valid_token(true).await, None);
        assert_eq!(manager.token(), None);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_joiner_falls_back_to_token_set_after_failed_refresh() {
        let transport = Arc::new(ScriptedTransport::new().with_latency(Duration::from_millis(50)));
        transport.push_ok(400, r#"{"error":"invalid_request"}"#);
        let (manager, _) = manager(&transport);

        let mut leader = pin!(manager.refresh(None));
        assert!(poll!(&mut leader).is_pending());
        let mut joiner = pin!(manager.get_valid_token(false));
        assert!(poll!(&mut joiner).is_pending());

        // The shared refresh fails and clears the store before the joiner resumes.
        assert!(leader.await.is_err());
        assert_eq!(manager.token(), None);
        manager.set_token_with_ttl("manual", 3600);

        assert_eq!(joiner.await.as_deref(), Some("manual"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_endpoint_yields_none() {
        let transport = Arc::new(ScriptedTransport::new());
        let manager = AuthManager::new(
            Credentials::new("c1", "s1"),
            AuthSettings::default(),
            transport.clone(),
            Arc::new(ManualClock::new()),
        );

        assert_eq!(manager.get_valid_token(false).await, None);
        let err = manager.refresh(None).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(transport.calls(), 0);

        manager.set_token_endpoint(ENDPOINT);
        assert_eq!(manager.token_endpoint().as_deref(), Some(ENDPOINT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_whole_record() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(Ok(HttpResponse::new(
            200,
            r#"{"access_token":"tok-B","expires_in":600}"#,
        )));
        let (manager, _) = manager(&transport);
        manager.set_token("tok-A", TokenExpiry::TtlSeconds(3600), Some("MAC"));

        manager.refresh(None).await.unwrap();

        assert_eq!(manager.token().as_deref(), Some("tok-B"));
        assert_eq!(manager.authorization_header().as_deref(), Some("Bearer tok-B"));
        assert_eq!(manager.time_until_expiration(), Duration::from_secs(600));
    }

    #[test]
    fn test_setters_and_accessors() {
        let transport = Arc::new(ScriptedTransport::new());
        let (manager, clock) = manager(&transport);

        let at = clock.now() + chrono::Duration::minutes(30);
        manager.set_token_with_expiry("abs", at);
        assert_eq!(manager.token_expiration(), Some(at));

        manager.set_token_no_expiry("dflt");
        assert_eq!(manager.time_until_expiration(), Duration::from_secs(3600));
        assert!(manager.status().is_valid());

        manager.clear_token();
        assert_eq!(manager.status(), TokenStatus::NotAuthenticated);
        assert_eq!(manager.credentials(), Credentials::new("c1", "s1"));
    }
}
