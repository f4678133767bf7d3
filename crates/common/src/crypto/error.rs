//! Error types for the callback crypto primitives
//!
//! Variants deliberately carry no key material, decrypted bytes or the
//! position at which a comparison diverged.

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Result alias for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures raised while encoding, decoding or authenticating envelopes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Key material has the wrong size
    #[error("AES key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Encoded key is not valid base64 of the expected length
    #[error("encoded AES key is malformed: {0}")]
    InvalidKeyEncoding(String),

    /// Ciphertext is not decodable or not block aligned
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Trailing pad is outside `[1, 32]` or inconsistent
    #[error("invalid padding")]
    InvalidPadding,

    /// Decrypted buffer violates the random/length/payload/identity layout
    #[error("malformed envelope: {0}")]
    Framing(&'static str),

    /// Payload does not fit in the 4-byte length prefix
    #[error("payload too large for envelope: {0} bytes")]
    PayloadTooLarge(usize),

    /// Recovered identity differs from the configured one
    #[error("envelope identity mismatch")]
    IdentityMismatch,

    /// Presented signature is not a 40 character SHA-1 hex digest
    #[error("signature must be 40 characters, got {actual}")]
    SignatureLength { actual: usize },

    /// Presented signature does not match the recomputed one
    #[error("signature mismatch")]
    SignatureMismatch,
}

impl ErrorClassification for CryptoError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidKeyLength { .. } | Self::InvalidKeyEncoding(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::InvalidKeyLength { .. } | Self::InvalidKeyEncoding(_))
    }
}
