//! Secure callback envelope protocol
//!
//! Holds the callback token, the identity envelopes must carry and, in
//! secure mode, the current/previous key ring. Decryption tries the current
//! key first and falls back to the previous key after a rotation.

use std::fmt;

use courier_common::crypto::envelope::{self, RANDOM_LEN};
use courier_common::crypto::sign_message;
use courier_common::{
    AesKey, DecryptedEnvelope, IdentityCheck, KeyRing, SecretString, SignatureVerifier,
};
use courier_domain::{CourierError, SdkConfig, SecureReply};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::error::CallbackError;

/// Authenticates, decrypts and seals callback payloads for one account
pub struct EnvelopeProtocol {
    token: SecretString,
    identity: String,
    keys: Option<RwLock<KeyRing>>,
    verifier: SignatureVerifier,
}

impl EnvelopeProtocol {
    /// Plain-mode protocol: signatures only, no envelope encryption.
    pub fn new(token: impl Into<SecretString>, identity: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            identity: identity.into(),
            keys: None,
            verifier: SignatureVerifier::new(),
        }
    }

    /// Enable secure mode with a single current key.
    pub fn with_key(self, key: AesKey) -> Self {
        self.with_key_ring(KeyRing::new(key))
    }

    /// Enable secure mode with a restored key ring.
    pub fn with_key_ring(mut self, ring: KeyRing) -> Self {
        self.keys = Some(RwLock::new(ring));
        self
    }

    /// Protocol for the account described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Config`] when the token is empty or the
    /// encoding AES key does not decode to 32 bytes.
    pub fn from_config(config: &SdkConfig) -> Result<Self, CourierError> {
        if config.token.is_empty() {
            return Err(CourierError::Config("token must not be empty".into()));
        }
        let protocol = Self::new(config.token.clone(), config.app_id.clone());
        Ok(match config.aes_key()? {
            Some(key) => protocol.with_key(key),
            None => protocol,
        })
    }

    /// Whether envelope encryption is configured.
    pub fn is_secure(&self) -> bool {
        self.keys.is_some()
    }

    /// Identity envelopes are expected to carry.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Verify a three-input signature over `(token, timestamp, nonce)`.
    pub fn verify_signature(
        &self,
        signature: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<(), CallbackError> {
        self.verifier
            .verify(signature, &[self.token.expose(), timestamp, nonce])
            .map_err(CallbackError::from)
    }

    /// Verify a four-input signature over `(token, timestamp, nonce, payload)`.
    pub fn verify_message_signature(
        &self,
        signature: &str,
        timestamp: &str,
        nonce: &str,
        payload: &str,
    ) -> Result<(), CallbackError> {
        self.verifier
            .verify(signature, &[self.token.expose(), timestamp, nonce, payload])
            .map_err(CallbackError::from)
    }

    /// Verify the message signature over `ciphertext_b64`, then decrypt it.
    ///
    /// The recovered identity must equal this protocol's identity exactly.
    pub fn verify_and_decrypt(
        &self,
        signature: &str,
        timestamp: &str,
        nonce: &str,
        ciphertext_b64: &str,
    ) -> Result<DecryptedEnvelope, CallbackError> {
        self.verify_message_signature(signature, timestamp, nonce, ciphertext_b64)?;
        self.decrypt(ciphertext_b64, IdentityCheck::Exact(&self.identity))
    }

    /// Decrypt with the current key, falling back to the previous one.
    pub fn decrypt(
        &self,
        ciphertext_b64: &str,
        check: IdentityCheck<'_>,
    ) -> Result<DecryptedEnvelope, CallbackError> {
        let keys = self.keys.as_ref().ok_or_else(Self::not_secure)?;
        let ring = keys.read();

        let primary = match envelope::decrypt_base64(ciphertext_b64, check, ring.current()) {
            Ok(opened) => return Ok(opened),
            Err(err) => err,
        };

        let Some(previous) = ring.fallback() else {
            return Err(primary.into());
        };

        match envelope::decrypt_base64(ciphertext_b64, check, previous) {
            Ok(opened) => {
                debug!(
                    key = %previous.fingerprint(),
                    "envelope opened with previous key after rotation"
                );
                Ok(opened)
            }
            // Report the current key's failure; the previous key is a fallback.
            Err(_) => Err(primary.into()),
        }
    }

    /// Seal `plaintext` as an encrypted reply under the current key.
    pub fn seal_reply(
        &self,
        plaintext: &str,
        timestamp: &str,
        nonce: &str,
        random: &[u8; RANDOM_LEN],
    ) -> Result<SecureReply, CallbackError> {
        let keys = self.keys.as_ref().ok_or_else(Self::not_secure)?;
        let encrypt = {
            let ring = keys.read();
            envelope::encrypt_to_base64(plaintext.as_bytes(), random, &self.identity, ring.current())
                .map_err(CallbackError::from)?
        };
        let msg_signature = sign_message(self.token.expose(), timestamp, nonce, &encrypt);
        Ok(SecureReply {
            encrypt,
            msg_signature,
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
        })
    }

    /// Install `new_key` as current, demoting the old current key.
    ///
    /// # Errors
    ///
    /// Fails in plain mode, where there is no ring to rotate.
    pub fn rotate_key(&self, new_key: AesKey) -> Result<(), CallbackError> {
        let keys = self.keys.as_ref().ok_or_else(Self::not_secure)?;
        let mut ring = keys.write();
        let previous = ring.current().fingerprint();
        let current = new_key.fingerprint();
        ring.rotate(new_key);
        info!(previous = %previous, current = %current, "callback key rotated");
        Ok(())
    }

    /// Fingerprints of the current and fallback keys, for diagnostics.
    pub fn key_fingerprints(&self) -> Option<(String, Option<String>)> {
        let ring = self.keys.as_ref()?.read();
        Some((ring.current().fingerprint(), ring.fallback().map(AesKey::fingerprint)))
    }

    fn not_secure() -> CallbackError {
        CallbackError::UnsupportedEncryption("no encoding AES key configured".into())
    }
}

impl fmt::Debug for EnvelopeProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeProtocol")
            .field("identity", &self.identity)
            .field("secure", &self.is_secure())
            .finish_non_exhaustive()
    }
}
