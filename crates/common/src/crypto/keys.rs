//! Symmetric keys for the callback envelope and their rotation pair
//!
//! The platform hands out AES keys as a 43 character base64 string (the
//! "encoding AES key"); decoded it yields exactly 32 bytes. The first 16 bytes
//! double as the CBC initialization vector.

use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{CryptoError, CryptoResult};

/// Platform keys are produced without padding and may carry non-canonical
/// trailing bits in the final character.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 256-bit AES key, zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey([u8; AesKey::LEN]);

impl AesKey {
    /// Raw key length in bytes
    pub const LEN: usize = 32;

    /// Length of the platform's base64 key encoding (no padding)
    pub const ENCODED_LEN: usize = 43;

    /// Build a key from exactly 32 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key: [u8; Self::LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: Self::LEN, actual: bytes.len() }
        })?;
        Ok(Self(key))
    }

    /// Decode the platform's 43 character base64 key.
    pub fn from_encoded(encoded: &str) -> CryptoResult<Self> {
        let trimmed = encoded.trim();
        if trimmed.len() != Self::ENCODED_LEN {
            return Err(CryptoError::InvalidKeyEncoding(format!(
                "expected {} characters, got {}",
                Self::ENCODED_LEN,
                trimmed.len()
            )));
        }

        let mut decoded = LENIENT_STANDARD
            .decode(trimmed)
            .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Generate a random key from the OS RNG.
    pub fn generate() -> Self {
        let mut key = [0u8; Self::LEN];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// The all-zero key. Never valid for decryption fallback.
    pub const fn zero() -> Self {
        Self([0u8; Self::LEN])
    }

    /// Whether every byte is zero (checked in constant time).
    pub fn is_zero(&self) -> bool {
        bool::from(self.0.ct_eq(&[0u8; Self::LEN]))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// CBC initialization vector (first 16 key bytes).
    pub fn iv(&self) -> &[u8] {
        &self.0[..16]
    }

    /// Short, non-reversible identifier safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }
}

impl From<[u8; AesKey::LEN]> for AesKey {
    fn from(bytes: [u8; AesKey::LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AesKey").field(&"[REDACTED]").finish()
    }
}

/// Current/previous key pair supporting zero-downtime rotation
///
/// `previous_valid` stays false until the first rotation. Regardless of the
/// flag, an all-zero previous key is never offered for fallback.
#[derive(Clone, Debug)]
pub struct KeyRing {
    current: AesKey,
    previous: AesKey,
    previous_valid: bool,
}

impl KeyRing {
    /// Ring holding only a current key.
    pub fn new(current: AesKey) -> Self {
        Self { current, previous: AesKey::zero(), previous_valid: false }
    }

    /// Ring restored with both keys, e.g. after a restart mid-rotation.
    pub fn with_previous(current: AesKey, previous: AesKey) -> Self {
        Self { current, previous, previous_valid: true }
    }

    /// Demote the current key to previous and install `new_key`.
    pub fn rotate(&mut self, new_key: AesKey) {
        self.previous = std::mem::replace(&mut self.current, new_key);
        self.previous_valid = true;
    }

    /// Key used for encryption and the first decryption attempt.
    pub fn current(&self) -> &AesKey {
        &self.current
    }

    /// Previous key if it may be used for fallback decryption.
    pub fn fallback(&self) -> Option<&AesKey> {
        if self.previous_valid && !self.previous.is_zero() {
            Some(&self.previous)
        } else {
            None
        }
    }

    /// Whether a rotation has happened (or a previous key was restored).
    pub fn previous_valid(&self) -> bool {
        self.previous_valid
    }
}
