//! Authenticated platform API client
//!
//! Every call carries the current credential as the `access_token` query
//! parameter. When the platform rejects it as expired, the client asks the
//! credential source to replace exactly that value and retries once.

use std::sync::Arc;
use std::time::Duration;

use courier_core::CredentialSource;
use courier_domain::constants::{
    ACCESS_TOKEN_PARAM, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
    EXPIRED_CREDENTIAL_CODES,
};
use courier_domain::{ApiEnvelope, CourierError, SdkConfig};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::errors::ApiError;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://api.weixin.qq.com")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ApiClientConfig {
    pub fn from_sdk(config: &SdkConfig) -> Self {
        Self { base_url: config.api_base_url.clone(), timeout: config.request_timeout() }
    }
}

/// API client with credential refresh
pub struct ApiClient {
    http_client: HttpClient,
    credentials: Arc<dyn CredentialSource>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be created
    pub fn new(
        config: ApiClientConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(3)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http_client, credentials, config })
    }

    /// Use a preconfigured transport (e.g. shorter back-off in tests).
    pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
        self.http_client = http_client;
        self
    }

    /// Execute a GET request
    ///
    /// `query` is sent alongside the credential parameter.
    ///
    /// # Errors
    ///
    /// [`ApiError::Platform`] for non-zero platform codes (after the single
    /// refresh-and-retry for expired credentials), or the transport/decode
    /// failure.
    #[instrument(skip(self, query), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.call(Method::GET, path, query, None).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// As for [`get`](Self::get); serialization failures map to
    /// [`ApiError::Decode`].
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body_json = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("Failed to serialize body: {e}")))?;
        self.call(Method::POST, path, &[], Some(body_json)).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = endpoint_url(&self.config.base_url, path)?;
        let credential = self.credentials.get_credential().await.map_err(credential_error)?;

        match self.execute(&method, &url, query, body.as_ref(), &credential).await {
            Err(err @ ApiError::Platform { .. }) if is_expired(&err) => {
                warn!(path, code = err.platform_code(), "credential rejected; refreshing once");
                let fresh = self
                    .credentials
                    .refresh_credential_if_current(&credential)
                    .await
                    .map_err(credential_error)?;
                self.execute(&method, &url, query, body.as_ref(), &fresh).await
            }
            other => other,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &Url,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
        credential: &str,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http_client
            .request(method.clone(), url.clone())
            .query(query)
            .query(&[(ACCESS_TOKEN_PARAM, credential)]);
        if let Some(body) = body {
            request = request.json(body);
        }

        let timeout = self.config.timeout;
        let response = match tokio::time::timeout(timeout, self.http_client.send(request)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(ApiError::Timeout(timeout)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http(format!("{} returned status {status}", url.path())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from(CourierError::from(InfraError::from(e))))?;
        let envelope = ApiEnvelope::<T>::from_slice(&bytes)?;
        debug!(path = url.path(), code = envelope.code, "platform response");
        Ok(envelope.into_result()?)
    }
}

fn is_expired(err: &ApiError) -> bool {
    err.platform_code().is_some_and(|code| EXPIRED_CREDENTIAL_CODES.contains(&code))
}

fn credential_error(err: CourierError) -> ApiError {
    ApiError::Credential(err.to_string())
}

/// `base` joined with an absolute `path`, keeping any path prefix on `base`.
pub(crate) fn endpoint_url(base: &str, path: &str) -> Result<Url, CourierError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| CourierError::Config(format!("Invalid API URL '{joined}': {e}")))
}
