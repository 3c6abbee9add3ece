//! Single-flight OAuth2 client-credentials refresh.
//!
//! At most one token request sequence runs per coordinator. Callers that
//! arrive while it is running await the same shared future and observe the
//! same outcome; no second request is sent. The sequence retries transient
//! failures with exponential backoff and clears the token store when it
//! finally gives up.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use payql_domain::auth::TokenErrorResponse;
use payql_domain::config::DEFAULT_AUTH_TIMEOUT;
use payql_domain::{AuthError, Credentials, TokenResponse};
use tracing::{debug, info, warn};

use super::{RetryPolicy, TokenStore};
use crate::ports::{HttpTransport, PostOptions, TransportError};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

type SharedRefresh = Shared<BoxFuture<'static, Result<(), AuthError>>>;

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { .. } | TransportError::Connection(_) => Self::Network {
                message: err.to_string(),
            },
            TransportError::InvalidRequest(message) | TransportError::Other(message) => {
                Self::unexpected(message)
            }
        }
    }
}

/// Owns the refresh protocol for one token store.
///
/// Cloning is cheap and every clone shares the same in-flight slot.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    credentials: Credentials,
    token_endpoint: RwLock<Option<String>>,
    store: Arc<TokenStore>,
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    auth_timeout: Duration,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl RefreshCoordinator {
    /// Creates a coordinator writing into `store`.
    #[must_use]
    pub fn new(
        credentials: Credentials,
        token_endpoint: Option<String>,
        store: Arc<TokenStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::with_policy(
            credentials,
            token_endpoint,
            store,
            transport,
            RetryPolicy::default(),
            DEFAULT_AUTH_TIMEOUT,
        )
    }

    /// Creates a coordinator with an explicit retry policy and auth timeout.
    #[must_use]
    pub fn with_policy(
        credentials: Credentials,
        token_endpoint: Option<String>,
        store: Arc<TokenStore>,
        transport: Arc<dyn HttpTransport>,
        policy: RetryPolicy,
        auth_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                credentials,
                token_endpoint: RwLock::new(token_endpoint),
                store,
                transport,
                policy,
                auth_timeout,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Acquires a new token, or joins the refresh already in flight.
    ///
    /// `endpoint_override` takes precedence over the configured endpoint. It
    /// is ignored when joining a refresh that is already running.
    ///
    /// # Errors
    ///
    /// Returns the final `AuthError` once retries are exhausted, or the first
    /// non-retryable one. The token store is cleared in both cases.
    pub async fn refresh(&self, endpoint_override: Option<&str>) -> Result<(), AuthError> {
        let operation = {
            let mut slot = self.inner.in_flight.lock();
            if let Some(running) = slot.as_ref() {
                debug!("joining in-flight token refresh");
                running.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let endpoint = endpoint_override.map(str::to_owned);
                let operation = async move {
                    let outcome = inner.run(endpoint).await;
                    // Empty the slot before any awaiter sees the outcome.
                    inner.in_flight.lock().take();
                    outcome
                }
                .boxed()
                .shared();
                *slot = Some(operation.clone());
                operation
            }
        };
        operation.await
    }

    /// True while a refresh is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// The configured token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> Option<String> {
        self.inner.token_endpoint.read().clone()
    }

    /// Replaces the configured token endpoint.
    pub fn set_token_endpoint(&self, token_endpoint: Option<String>) {
        *self.inner.token_endpoint.write() = token_endpoint;
    }

    /// Copy of the client credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        self.inner.credentials.clone()
    }

    /// The retry policy in use.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.inner.policy
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("credentials", &self.inner.credentials)
            .field("token_endpoint", &self.token_endpoint())
            .field("policy", &self.inner.policy)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl Inner {
    async fn run(&self, endpoint_override: Option<String>) -> Result<(), AuthError> {
        match self.acquire(endpoint_override).await {
            Ok(response) => {
                let record = response.into_record(self.store.now());
                info!(
                    token = %record.preview(),
                    expires_at = %record.expires_at,
                    "access token acquired"
                );
                self.store.replace(record);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing stored token");
                self.store.clear();
                Err(err)
            }
        }
    }

    async fn acquire(&self, endpoint_override: Option<String>) -> Result<TokenResponse, AuthError> {
        // A blank override counts as no override.
        let endpoint = endpoint_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                self.token_endpoint
                    .read()
                    .clone()
                    .filter(|url| !url.trim().is_empty())
            })
            .ok_or_else(AuthError::endpoint_not_configured)?;

        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;
        loop {
            debug!(attempt = attempt + 1, max_attempts, "requesting access token");
            let err = match self.request_token(&endpoint).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt + 1 >= max_attempts {
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "token request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn request_token(&self, endpoint: &str) -> Result<TokenResponse, AuthError> {
        let body = serde_urlencoded::to_string(self.credentials.grant_form())
            .map_err(|e| AuthError::unexpected(format!("failed to encode token request: {e}")))?;

        let options = PostOptions::new(self.auth_timeout)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .header("Accept", "application/json");

        let response = self
            .transport
            .post(endpoint, body.into_bytes(), &options)
            .await?;

        if !response.is_success() {
            let message = serde_json::from_slice::<TokenErrorResponse>(&response.body)
                .map_or_else(|_| response.text(), |e| e.message());
            return Err(AuthError::TokenEndpoint {
                status: response.status,
                message,
            });
        }

        TokenResponse::parse(&response.body)
    }
}
