//! Callback signatures
//!
//! The platform signs a callback by sorting its string inputs
//! lexicographically, concatenating them with no delimiter and hex-encoding
//! the SHA-1 digest. The handshake signs `(token, timestamp, nonce)`; message
//! delivery adds the base64 ciphertext (or echo string) as a fourth input.

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use super::error::{CryptoError, CryptoResult};

/// Length of a hex-encoded SHA-1 digest
pub const SIGNATURE_LEN: usize = 40;

/// Sign an arbitrary set of inputs; input order does not matter.
pub fn sign(parts: &[&str]) -> String {
    let mut sorted = parts.to_vec();
    sorted.sort_unstable();

    let mut hasher = Sha1::new();
    for part in sorted {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Handshake variant: `(token, timestamp, nonce)`.
pub fn sign_handshake(token: &str, timestamp: &str, nonce: &str) -> String {
    sign(&[token, timestamp, nonce])
}

/// Message variant: `(token, timestamp, nonce, ciphertext_or_echo)`.
pub fn sign_message(token: &str, timestamp: &str, nonce: &str, payload: &str) -> String {
    sign(&[token, timestamp, nonce, payload])
}

/// Equality check that does not leak where two inputs diverge
pub trait ConstantTimeComparator: Send + Sync {
    /// Compare two byte strings. Differing lengths compare unequal.
    fn equals(&self, a: &[u8], b: &[u8]) -> bool;
}

/// [`ConstantTimeComparator`] backed by `subtle`
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtleComparator;

impl ConstantTimeComparator for SubtleComparator {
    fn equals(&self, a: &[u8], b: &[u8]) -> bool {
        constant_time_eq(a, b)
    }
}

/// Constant-time equality; slices of different length are unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    bool::from(a.ct_eq(b))
}

/// Verifies presented signatures against recomputed ones
///
/// Any presented signature whose length is not exactly [`SIGNATURE_LEN`] is
/// rejected before the comparator is consulted.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier<C = SubtleComparator> {
    comparator: C,
}

impl SignatureVerifier<SubtleComparator> {
    /// Verifier using the default constant-time comparator.
    pub fn new() -> Self {
        Self { comparator: SubtleComparator }
    }
}

impl<C: ConstantTimeComparator> SignatureVerifier<C> {
    /// Verifier using a caller-supplied comparator.
    pub fn with_comparator(comparator: C) -> Self {
        Self { comparator }
    }

    /// Check `presented` against the signature of `parts`.
    pub fn verify(&self, presented: &str, parts: &[&str]) -> CryptoResult<()> {
        if presented.len() != SIGNATURE_LEN {
            return Err(CryptoError::SignatureLength { actual: presented.len() });
        }

        let expected = sign(parts);
        if self.comparator.equals(expected.as_bytes(), presented.as_bytes()) {
            Ok(())
        } else {
            Err(CryptoError::SignatureMismatch)
        }
    }
}
