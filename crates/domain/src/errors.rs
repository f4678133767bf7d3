//! Error types used throughout the SDK

use courier_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use courier_common::CryptoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{EXPIRED_CREDENTIAL_CODES, SYSTEM_BUSY_CODE};

/// Main error type for Courier
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

impl CourierError {
    /// Whether the platform rejected the credential attached to a call.
    pub fn is_expired_credential(&self) -> bool {
        matches!(self, Self::Upstream { code, .. } if EXPIRED_CREDENTIAL_CODES.contains(code))
    }
}

impl ErrorClassification for CourierError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Upstream { code, .. } => *code == SYSTEM_BUSY_CODE,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(_) | Self::Internal(_) => ErrorSeverity::Critical,
            Self::Network(_) => ErrorSeverity::Warning,
            Self::Upstream { code, .. } if *code == SYSTEM_BUSY_CODE => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Internal(_))
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<quick_xml::DeError> for CourierError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<CommonError> for CourierError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Config { .. } => Self::Config(err.to_string()),
            CommonError::Decode { .. } => Self::Decode(err.to_string()),
            CommonError::Timeout { .. } => Self::Network(err.to_string()),
            CommonError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<CryptoError> for CourierError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyLength { .. } | CryptoError::InvalidKeyEncoding(_) => {
                Self::Config(err.to_string())
            }
            other => Self::Decode(other.to_string()),
        }
    }
}
