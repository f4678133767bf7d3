//! Token-endpoint credential fetcher

use async_trait::async_trait;
use courier_common::SecretString;
use courier_core::CredentialFetcher;
use courier_domain::constants::{TOKEN_ENDPOINT_PATH, TOKEN_GRANT_TYPE};
use courier_domain::{ApiEnvelope, CourierError, FetchedCredential, Result, SdkConfig};
use reqwest::Method;
use tracing::{debug, instrument};
use url::Url;

use super::client::endpoint_url;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Fetches bearer credentials with the application id and secret
///
/// Fetches run under the coordinator's refresh lock, so a fetcher built with
/// [`from_config`](Self::from_config) sends one request per
/// [`fetch`](CredentialFetcher::fetch) and leaves retrying to the renewal
/// loop. A client passed to [`new`](Self::new) keeps its own retry policy.
pub struct HttpCredentialFetcher {
    http: HttpClient,
    endpoint: Url,
    app_id: String,
    app_secret: SecretString,
}

impl HttpCredentialFetcher {
    /// # Errors
    ///
    /// Returns [`CourierError::Config`] when `base_url` is not a valid URL.
    pub fn new(
        http: HttpClient,
        base_url: &str,
        app_id: impl Into<String>,
        app_secret: impl Into<SecretString>,
    ) -> Result<Self> {
        Ok(Self {
            http,
            endpoint: endpoint_url(base_url, TOKEN_ENDPOINT_PATH)?,
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        })
    }

    /// Fetcher for the account described by `config`.
    pub fn from_config(config: &SdkConfig) -> Result<Self> {
        config.validate()?;
        let http =
            HttpClient::builder().timeout(config.request_timeout()).max_attempts(1).build()?;
        Self::new(http, &config.api_base_url, config.app_id.clone(), config.app_secret.clone())
    }
}

#[async_trait]
impl CredentialFetcher for HttpCredentialFetcher {
    #[instrument(name = "credential.fetch", skip(self), fields(app_id = %self.app_id))]
    async fn fetch(&self) -> Result<FetchedCredential> {
        let request = self.http.request(Method::GET, self.endpoint.clone()).query(&[
            ("grant_type", TOKEN_GRANT_TYPE),
            ("appid", self.app_id.as_str()),
            ("secret", self.app_secret.expose()),
        ]);

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::Network(format!("token endpoint returned HTTP {status}")));
        }

        let body = response.bytes().await.map_err(|err| CourierError::from(InfraError::from(err)))?;
        let fetched = ApiEnvelope::<FetchedCredential>::from_slice(&body)?.into_result()?;
        debug!(expires_in = fetched.expires_in, "token endpoint issued credential");
        Ok(fetched)
    }
}
