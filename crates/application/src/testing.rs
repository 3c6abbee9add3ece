//! Fakes for the ports, shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::ports::{Clock, HttpResponse, HttpTransport, PostOptions, TransportError};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(by).unwrap_or_default();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// A request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: String,
    pub options: PostOptions,
}

/// Transport that replays queued responses, then a fallback.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    fallback: Option<Result<HttpResponse, TransportError>>,
    latency: Duration,
    requests: Mutex<Vec<RecordedRequest>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_fallback(mut self, fallback: Result<HttpResponse, TransportError>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn push(&self, outcome: Result<HttpResponse, TransportError>) {
        self.script.lock().push_back(outcome);
    }

    pub fn push_ok(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        options: &PostOptions,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
            options: options.clone(),
        });
        self.call_times.lock().push(Instant::now());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().pop_front();
        next.or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

/// A successful token endpoint body.
pub fn token_body(token: &str, expires_in: u64) -> Vec<u8> {
    format!(r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":{expires_in}}}"#)
        .into_bytes()
}
