//! SDK configuration
//!
//! One [`SdkConfig`] describes one platform account: the application
//! credentials used for outbound calls and the callback secrets used to
//! authenticate inbound deliveries. Loading from the environment or files
//! lives in `courier-infra::config`.

use std::time::Duration;

use courier_common::{AesKey, CommonError, SecretString};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CONVERGENCE_WINDOW_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_INTERVAL_SECS, MAX_CONVERGENCE_WINDOW_SECS, MIN_CONVERGENCE_WINDOW_SECS,
};
use crate::errors::{CourierError, Result};

/// Configuration for a single platform account
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Application id issued by the platform
    pub app_id: String,
    /// Application secret used to obtain credentials
    pub app_secret: SecretString,
    /// Account id callbacks must be addressed to, if enforced
    pub account_id: Option<String>,
    /// Shared secret callbacks are signed with
    pub token: SecretString,
    /// 43 character encoding AES key; absent means plain-mode callbacks
    pub encoding_aes_key: Option<SecretString>,
    /// Base URL of the platform API
    pub api_base_url: String,
    /// Per-request timeout for outbound calls
    pub request_timeout_secs: u64,
    /// Refreshes within this many seconds of a successful fetch reuse it
    pub convergence_window_secs: u64,
    /// Delay before the renewal loop retries a failed refresh
    pub retry_interval_secs: u64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: SecretString::default(),
            account_id: None,
            token: SecretString::default(),
            encoding_aes_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            convergence_window_secs: DEFAULT_CONVERGENCE_WINDOW_SECS,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

impl SdkConfig {
    /// Configuration with the required fields set and defaults elsewhere.
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<SecretString>,
        token: impl Into<SecretString>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_encoding_aes_key(mut self, key: impl Into<SecretString>) -> Self {
        self.encoding_aes_key = Some(key.into());
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_convergence_window_secs(mut self, secs: u64) -> Self {
        self.convergence_window_secs = secs;
        self
    }

    /// Check required fields and ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("app_id", self.app_id.trim().is_empty()),
            ("app_secret", self.app_secret.is_empty()),
            ("token", self.token.is_empty()),
            ("api_base_url", self.api_base_url.trim().is_empty()),
        ];
        if let Some((field, _)) = required.into_iter().find(|(_, missing)| *missing) {
            return Err(CommonError::config(field, "must not be empty").into());
        }
        if !(MIN_CONVERGENCE_WINDOW_SECS..=MAX_CONVERGENCE_WINDOW_SECS)
            .contains(&self.convergence_window_secs)
        {
            return Err(CommonError::config(
                "convergence_window_secs",
                format!(
                    "must be within [{MIN_CONVERGENCE_WINDOW_SECS}, {MAX_CONVERGENCE_WINDOW_SECS}], got {}",
                    self.convergence_window_secs
                ),
            )
            .into());
        }
        if self.request_timeout_secs == 0 {
            return Err(CommonError::config("request_timeout_secs", "must be positive").into());
        }
        if self.retry_interval_secs == 0 {
            return Err(CommonError::config("retry_interval_secs", "must be positive").into());
        }
        self.aes_key()?;
        Ok(())
    }

    /// Decoded callback key, if one is configured.
    pub fn aes_key(&self) -> Result<Option<AesKey>> {
        self.encoding_aes_key
            .as_ref()
            .map(|encoded| AesKey::from_encoded(encoded.expose()).map_err(CourierError::from))
            .transpose()
    }

    pub fn convergence_window(&self) -> Duration {
        Duration::from_secs(self.convergence_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODED_KEY: &str = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG";

    fn valid() -> SdkConfig {
        SdkConfig::new("wx-app", "app-secret", "callback-token")
    }

    #[test]
    fn defaults_pass_validation() {
        let config = valid();
        assert!(config.validate().is_ok());
        assert_eq!(config.convergence_window(), Duration::from_secs(5));
        assert_eq!(config.retry_interval(), Duration::from_secs(60));
        assert!(config.aes_key().unwrap().is_none());
    }

    #[test]
    fn empty_required_fields_are_rejected() {
        let mut config = valid();
        config.app_id = "  ".into();
        assert!(matches!(config.validate(), Err(CourierError::Config(msg)) if msg.contains("app_id")));

        let config = SdkConfig::new("wx-app", "", "token");
        assert!(config.validate().is_err());

        let config = SdkConfig::new("wx-app", "secret", "");
        assert!(config.validate().is_err());
    }

    /// Validates the convergence window range scenario.
    ///
    /// Assertions:
    /// - Ensures 2 through 5 seconds are accepted.
    /// - Ensures 1 and 6 seconds are rejected.
    #[test]
    fn convergence_window_must_be_in_range() {
        for secs in 2..=5 {
            assert!(valid().with_convergence_window_secs(secs).validate().is_ok(), "{secs}");
        }
        for secs in [0, 1, 6, 30] {
            assert!(valid().with_convergence_window_secs(secs).validate().is_err(), "{secs}");
        }
    }

    #[test]
    fn malformed_aes_key_fails_validation() {
        let config = valid().with_encoding_aes_key("not-a-key");
        assert!(matches!(config.validate(), Err(CourierError::Config(_))));

        let config = valid().with_encoding_aes_key(ENCODED_KEY);
        assert!(config.validate().is_ok());
        assert!(config.aes_key().unwrap().is_some());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: SdkConfig = serde_json::from_str(
            r#"{"app_id":"wx-app","app_secret":"s","token":"t","account_id":"gh_1"}"#,
        )
        .unwrap();
        assert_eq!(config.account_id.as_deref(), Some("gh_1"));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.convergence_window_secs, DEFAULT_CONVERGENCE_WINDOW_SECS);
        assert!(format!("{config:?}").contains("SecretString(***)"));
    }
}
