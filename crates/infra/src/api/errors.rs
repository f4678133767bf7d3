//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use std::time::Duration;

use courier_common::error::{ErrorClassification, ErrorSeverity};
use courier_domain::constants::SYSTEM_BUSY_CODE;
use courier_domain::CourierError;
use thiserror::Error;

/// API operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No credential could be obtained for the call
    #[error("Credential unavailable: {0}")]
    Credential(String),

    /// The platform answered with a non-zero `errcode`
    #[error("Platform error {code}: {message}")]
    Platform { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Platform error code, if the platform produced this error.
    pub fn platform_code(&self) -> Option<i64> {
        match self {
            Self::Platform { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Get suggested retry delay in seconds
    pub fn retry_delay_secs(&self) -> u64 {
        match self {
            Self::Platform { code, .. } if *code == SYSTEM_BUSY_CODE => 1,
            Self::Http(_) | Self::Timeout(_) => 5,
            Self::Credential(_) => 10,
            _ => 0,
        }
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.retry_delay_secs() > 0
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(_) => ErrorSeverity::Critical,
            Self::Http(_) | Self::Timeout(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        self.is_retryable().then(|| Duration::from_secs(self.retry_delay_secs()))
    }
}

/// Convert from the domain error
impl From<CourierError> for ApiError {
    fn from(err: CourierError) -> Self {
        match err {
            CourierError::Upstream { code, message } => Self::Platform { code, message },
            CourierError::Network(message) | CourierError::Internal(message) => Self::Http(message),
            CourierError::Decode(message) => Self::Decode(message),
            CourierError::Config(message) => Self::Config(message),
            CourierError::Credential(message) => Self::Credential(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_conversion() {
        assert_eq!(
            ApiError::from(CourierError::Upstream { code: 40001, message: "invalid".into() }),
            ApiError::Platform { code: 40001, message: "invalid".into() }
        );
        assert_eq!(
            ApiError::from(CourierError::Network("reset".into())),
            ApiError::Http("reset".into())
        );
        assert!(matches!(
            ApiError::from(CourierError::Config("bad".into())),
            ApiError::Config(_)
        ));
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::Http("test".to_string()).is_retryable());
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ApiError::Platform { code: -1, message: "busy".into() }.is_retryable());
        assert!(!ApiError::Platform { code: 40013, message: "bad appid".into() }.is_retryable());
        assert!(!ApiError::Decode("test".to_string()).is_retryable());
        assert!(!ApiError::Config("test".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_delays() {
        assert_eq!(
            ApiError::Platform { code: -1, message: String::new() }.retry_after(),
            Some(Duration::from_secs(1))
        );
        assert_eq!(ApiError::Http("test".to_string()).retry_delay_secs(), 5);
        assert_eq!(ApiError::Config("test".to_string()).retry_after(), None);
        assert!(ApiError::Config("test".to_string()).is_critical());
    }
}
