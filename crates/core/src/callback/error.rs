//! Callback rejection reasons
//!
//! Messages name the failed check only; they never carry signatures, key
//! material or where two values diverged.

use courier_common::error::{ErrorClassification, ErrorSeverity};
use courier_common::CryptoError;
use courier_domain::CourierError;
use thiserror::Error;

/// Why an inbound callback was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// A required query parameter was absent or empty
    #[error("missing query parameter `{0}`")]
    MissingParameter(&'static str),

    /// `timestamp` is not ASCII digits fitting in a `u64`
    #[error("timestamp is not a decimal number")]
    InvalidTimestamp,

    /// A presented signature had the wrong length or did not match
    #[error("signature mismatch")]
    SignatureMismatch,

    /// Account id or envelope identity differs from the configured one
    #[error("recipient identity mismatch")]
    IdentityMismatch,

    /// Outer body or decrypted message XML could not be parsed
    #[error("malformed callback body: {0}")]
    MalformedBody(String),

    /// Ciphertext failed to decrypt or unframe under every available key
    #[error("envelope decryption failed: {0}")]
    Decrypt(String),

    /// `encrypt_type` is neither plain nor `aes`, or `aes` without a key
    #[error("unsupported encryption: {0}")]
    UnsupportedEncryption(String),
}

impl ErrorClassification for CallbackError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Decrypt(_) | Self::UnsupportedEncryption(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }
}

impl From<CryptoError> for CallbackError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::SignatureLength { .. } | CryptoError::SignatureMismatch => {
                Self::SignatureMismatch
            }
            CryptoError::IdentityMismatch => Self::IdentityMismatch,
            other => Self::Decrypt(other.to_string()),
        }
    }
}

impl From<CourierError> for CallbackError {
    fn from(err: CourierError) -> Self {
        Self::MalformedBody(err.to_string())
    }
}
