use std::time::Duration;

use courier_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use courier_domain::CourierError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

const DEFAULT_ATTEMPTS: usize = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

/// Platform API transport.
///
/// Gateway errors (5xx) and dropped connections are retried with doubling
/// back-off; everything else is handed to the caller, who decodes the
/// platform envelope. Platform URLs carry `secret` and `access_token` in the
/// query string, so only the path is ever logged.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetrySchedule,
}

#[derive(Debug, Clone, Copy)]
struct RetrySchedule {
    attempts: usize,
    base: Duration,
}

impl RetrySchedule {
    /// Delay before retry number `retry` (1-based), capped at 256x the base.
    fn delay(self, retry: usize) -> Duration {
        let doublings = retry.saturating_sub(1).min(8);
        self.base.saturating_mul(1 << doublings)
    }

    fn has_more(self, attempt: usize) -> bool {
        attempt < self.attempts
    }
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, CourierError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, re-sending a fresh clone of it on transient failure.
    ///
    /// Streaming bodies cannot be cloned and are rejected up front.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, CourierError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = builder
                .try_clone()
                .ok_or_else(|| CourierError::Internal("platform request body is not replayable".into()))?
                .build()
                .map_err(|err| CourierError::from(InfraError::from(err)))?;
            let path = request.url().path().to_owned();

            let failure = match self.client.execute(request).await {
                Ok(response) if response.status().is_server_error() && self.retry.has_more(attempt) => {
                    debug!(attempt, %path, status = %response.status(), "platform gateway error, retrying");
                    None
                }
                Ok(response) => {
                    debug!(attempt, %path, status = %response.status(), "platform responded");
                    return Ok(response);
                }
                Err(err) => Some(err.without_url()),
            };

            if let Some(err) = failure {
                if !(is_transient(&err) && self.retry.has_more(attempt)) {
                    debug!(attempt, %path, error = %err, "platform request failed");
                    return Err(InfraError::from(err).into());
                }
                debug!(attempt, %path, error = %err, "transient transport failure, retrying");
            }

            let delay = self.retry.delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetrySchedule,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetrySchedule { attempts: DEFAULT_ATTEMPTS, base: DEFAULT_BACKOFF },
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-attempt timeout enforced by reqwest.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first; values below one mean one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, CourierError> {
        let builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        let builder = match self.user_agent {
            Some(agent) => builder.user_agent(agent),
            None => builder,
        };
        let client = builder.build().map_err(|err| CourierError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, retry: self.retry })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}
