//! GraphQL request layer.
//!
//! Sends GraphQL documents to the payments API with the access token managed
//! by [`AuthManager`] attached as the `Authorization` header.

use std::sync::Arc;
use std::time::Duration;

use payql_domain::{GraphqlOperation, GraphqlRequest, GraphqlResponse, SdkConfig};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::error::{SdkError, SdkResult};
use crate::ports::{HttpResponse, HttpTransport, PostOptions};

/// Authenticated GraphQL client.
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(ReqwestTransport::new()?);
/// let clock = Arc::new(SystemClock);
/// let auth = Arc::new(AuthManager::from_config(&config, transport.clone(), clock));
/// let client = GraphqlClient::new(&config, auth, transport)?;
///
/// let payment = client.execute::<PaymentQuery>(&PaymentVars { id: "pay_1".into() }).await?;
/// ```
pub struct GraphqlClient {
    endpoint: String,
    timeout: Duration,
    auth: Arc<AuthManager>,
    transport: Arc<dyn HttpTransport>,
}

impl GraphqlClient {
    /// Creates a client after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Config` if the configuration is invalid.
    pub fn new(
        config: &SdkConfig,
        auth: Arc<AuthManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            timeout: config.timeout,
            auth,
            transport,
        })
    }

    /// The auth manager used by this client.
    #[must_use]
    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Runs a typed operation and returns its data.
    ///
    /// # Errors
    ///
    /// Returns an `SdkError` for auth, transport, HTTP, GraphQL or decoding
    /// failures.
    pub async fn execute<Op: GraphqlOperation>(
        &self,
        variables: &Op::Variables,
    ) -> SdkResult<Op::ResponseData> {
        let request = GraphqlRequest {
            query: Op::QUERY,
            variables: Some(variables),
            operation_name: Some(Op::OPERATION_NAME),
        };
        let body = serde_json::to_vec(&request)?;
        let response = self.send(body, Op::OPERATION_NAME).await?;
        decode(&response)
    }

    /// Runs an untyped document and returns the `data` object.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn raw(
        &self,
        query: &str,
        variables: Option<&Value>,
        operation_name: Option<&str>,
    ) -> SdkResult<Value> {
        let request = GraphqlRequest {
            query,
            variables,
            operation_name,
        };
        let body = serde_json::to_vec(&request)?;
        let response = self
            .send(body, operation_name.unwrap_or("anonymous"))
            .await?;
        decode(&response)
    }

    async fn send(&self, body: Vec<u8>, operation: &str) -> SdkResult<HttpResponse> {
        let request_id = Uuid::now_v7();
        let span = info_span!("graphql", %request_id, operation);
        async move {
            let header = self.authorization(false).await?;
            let response = self.post(body.clone(), &header, request_id).await?;
            if response.status != 401 {
                return Ok(response);
            }

            warn!("access token rejected, refreshing and retrying once");
            let header = self.authorization(true).await?;
            self.post(body, &header, request_id).await
        }
        .instrument(span)
        .await
    }

    async fn authorization(&self, force_refresh: bool) -> SdkResult<String> {
        if self.auth.get_valid_token(force_refresh).await.is_none() {
            return Err(SdkError::AuthenticationUnavailable);
        }
        self.auth
            .authorization_header()
            .ok_or(SdkError::AuthenticationUnavailable)
    }

    async fn post(
        &self,
        body: Vec<u8>,
        authorization: &str,
        request_id: Uuid,
    ) -> SdkResult<HttpResponse> {
        let options = PostOptions::new(self.timeout)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Authorization", authorization)
            .header("X-Request-Id", request_id.to_string());
        let response = self.transport.post(&self.endpoint, body, &options).await?;
        debug!(status = response.status, "GraphQL response received");
        Ok(response)
    }
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> SdkResult<T> {
    if !response.is_success() {
        return Err(SdkError::Http {
            status: response.status,
            body: response.text(),
        });
    }
    let envelope: GraphqlResponse<T> = serde_json::from_slice(&response.body)?;
    if !envelope.errors.is_empty() {
        return Err(SdkError::Graphql {
            errors: envelope.errors,
        });
    }
    envelope.data.ok_or(SdkError::MissingData)
}
