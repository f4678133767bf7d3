//! Callback envelope cipher
//!
//! Wire layout before padding:
//!
//! ```text
//! +-------------+----------------+-----------+----------+
//! | random (16) | len (4, BE u32) | payload   | identity |
//! +-------------+----------------+-----------+----------+
//! ```
//!
//! The buffer is padded PKCS#7-style to a multiple of 32 bytes (the
//! platform's block size, not AES's 16) and encrypted with AES-256-CBC using
//! the key's first 16 bytes as IV. No padding is added by the cipher itself.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use super::error::{CryptoError, CryptoResult};
use super::keys::AesKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Padding block size used by the platform
pub const BLOCK_SIZE: usize = 32;

/// Cipher block size; ciphertext must be a whole number of these
const AES_BLOCK_SIZE: usize = 16;

/// Length of the random prefix
pub const RANDOM_LEN: usize = 16;

const LENGTH_PREFIX_LEN: usize = 4;
const HEADER_LEN: usize = RANDOM_LEN + LENGTH_PREFIX_LEN;

/// How the identity trailer is checked during decryption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityCheck<'a> {
    /// Trailer must equal the given identity
    Exact(&'a str),
    /// Trailer must equal the given identity or be a placeholder (empty or
    /// all `'0'`); the caller decides whether a placeholder is acceptable
    /// for the parsed message
    AllowPlaceholder(&'a str),
}

/// Plaintext recovered from an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedEnvelope {
    /// Message payload
    pub payload: Vec<u8>,
    /// Random prefix, reused when sealing the reply
    pub random: [u8; RANDOM_LEN],
    /// Identity trailer as sent
    pub identity: String,
}

impl DecryptedEnvelope {
    /// Whether the trailer carried a placeholder instead of an identity.
    pub fn has_placeholder_identity(&self) -> bool {
        is_placeholder_identity(self.identity.as_bytes())
    }
}

/// Empty or all-`'0'` identities stand in for account-wide deliveries.
pub fn is_placeholder_identity(identity: &[u8]) -> bool {
    identity.iter().all(|&b| b == b'0')
}

/// Fresh random prefix from the OS RNG.
pub fn generate_random() -> [u8; RANDOM_LEN] {
    let mut random = [0u8; RANDOM_LEN];
    OsRng.fill_bytes(&mut random);
    random
}

/// Build the unpadded envelope buffer.
pub fn frame(payload: &[u8], random: &[u8; RANDOM_LEN], identity: &str) -> CryptoResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| CryptoError::PayloadTooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + identity.len() + BLOCK_SIZE);
    buf.extend_from_slice(random);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(identity.as_bytes());
    Ok(buf)
}

/// Append PKCS#7-style padding with a 32-byte block.
pub fn pad(mut buf: Vec<u8>) -> Vec<u8> {
    let amount = BLOCK_SIZE - buf.len() % BLOCK_SIZE;
    // amount is in 1..=32
    buf.resize(buf.len() + amount, amount as u8);
    buf
}

/// Strip padding added by [`pad`].
pub fn unpad(buf: &[u8]) -> CryptoResult<&[u8]> {
    let amount = usize::from(*buf.last().ok_or(CryptoError::InvalidPadding)?);
    if amount == 0 || amount > BLOCK_SIZE || amount > buf.len() {
        return Err(CryptoError::InvalidPadding);
    }

    let (body, padding) = buf.split_at(buf.len() - amount);
    let consistent = padding.iter().fold(0u8, |acc, &b| acc | (b ^ amount as u8));
    if consistent != 0 {
        return Err(CryptoError::InvalidPadding);
    }
    Ok(body)
}

/// Encrypt `payload` into raw envelope ciphertext.
pub fn encrypt(
    payload: &[u8],
    random: &[u8; RANDOM_LEN],
    identity: &str,
    key: &AesKey,
) -> CryptoResult<Vec<u8>> {
    let padded = pad(frame(payload, random, identity)?);
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), key.iv())
        .map_err(|_| CryptoError::InvalidKeyLength { expected: AesKey::LEN, actual: 0 })?;
    Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(&padded))
}

/// Encrypt and encode with standard base64 (the wire form).
pub fn encrypt_to_base64(
    payload: &[u8],
    random: &[u8; RANDOM_LEN],
    identity: &str,
    key: &AesKey,
) -> CryptoResult<String> {
    encrypt(payload, random, identity, key).map(|ciphertext| BASE64.encode(ciphertext))
}

/// Decrypt raw envelope ciphertext and verify its identity trailer.
pub fn decrypt(
    ciphertext: &[u8],
    check: IdentityCheck<'_>,
    key: &AesKey,
) -> CryptoResult<DecryptedEnvelope> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertext(format!(
            "length {} is not a positive multiple of {AES_BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), key.iv())
        .map_err(|_| CryptoError::InvalidKeyLength { expected: AesKey::LEN, actual: 0 })?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| CryptoError::InvalidCiphertext("not block aligned".to_string()))?;

    let body = unpad(&plaintext)?;
    let (random, payload, identity) = unframe(body)?;

    let accepted = match check {
        IdentityCheck::Exact(expected) => identity_matches(identity, expected),
        IdentityCheck::AllowPlaceholder(expected) => {
            identity_matches(identity, expected) || is_placeholder_identity(identity)
        }
    };
    if !accepted {
        return Err(CryptoError::IdentityMismatch);
    }

    let identity = std::str::from_utf8(identity)
        .map_err(|_| CryptoError::Framing("identity is not UTF-8"))?
        .to_string();

    Ok(DecryptedEnvelope { payload: payload.to_vec(), random, identity })
}

/// Decode standard base64 and decrypt.
pub fn decrypt_base64(
    ciphertext_b64: &str,
    check: IdentityCheck<'_>,
    key: &AesKey,
) -> CryptoResult<DecryptedEnvelope> {
    let ciphertext = BASE64
        .decode(ciphertext_b64.trim())
        .map_err(|e| CryptoError::InvalidCiphertext(format!("base64: {e}")))?;
    decrypt(&ciphertext, check, key)
}

fn unframe(body: &[u8]) -> CryptoResult<([u8; RANDOM_LEN], &[u8], &[u8])> {
    if body.len() < HEADER_LEN {
        return Err(CryptoError::Framing("shorter than header"));
    }

    let mut random = [0u8; RANDOM_LEN];
    random.copy_from_slice(&body[..RANDOM_LEN]);

    let mut len_bytes = [0u8; LENGTH_PREFIX_LEN];
    len_bytes.copy_from_slice(&body[RANDOM_LEN..HEADER_LEN]);
    let payload_len = u32::from_be_bytes(len_bytes) as usize;

    let payload_end = HEADER_LEN
        .checked_add(payload_len)
        .filter(|end| *end <= body.len())
        .ok_or(CryptoError::Framing("length prefix overruns buffer"))?;

    Ok((random, &body[HEADER_LEN..payload_end], &body[payload_end..]))
}

fn identity_matches(identity: &[u8], expected: &str) -> bool {
    bool::from(identity.ct_eq(expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: &str = "wx2c2769f8efd9abc2";

    fn key(byte: u8) -> AesKey {
        AesKey::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn round_trip_recovers_payload_and_random() {
        let random = [3u8; RANDOM_LEN];
        let ciphertext = encrypt(b"<xml>hello</xml>", &random, IDENTITY, &key(1)).unwrap();
        let opened = decrypt(&ciphertext, IdentityCheck::Exact(IDENTITY), &key(1)).unwrap();

        assert_eq!(opened.payload, b"<xml>hello</xml>");
        assert_eq!(opened.random, random);
        assert_eq!(opened.identity, IDENTITY);
    }

    #[test]
    fn round_trip_over_payload_sizes() {
        let k = AesKey::generate();
        for size in [0usize, 1, 11, 12, 31, 32, 33, 64, 1000, 4096] {
            let payload = vec![b'a'; size];
            let random = generate_random();
            let b64 = encrypt_to_base64(&payload, &random, IDENTITY, &k).unwrap();
            let opened = decrypt_base64(&b64, IdentityCheck::Exact(IDENTITY), &k).unwrap();
            assert_eq!(opened.payload, payload, "size {size}");
            assert_eq!(opened.random, random);
        }
    }

    #[test]
    fn padded_length_is_positive_multiple_of_block() {
        for len in 0..=96 {
            let padded = pad(vec![0u8; len]);
            assert!(!padded.is_empty());
            assert_eq!(padded.len() % BLOCK_SIZE, 0, "input length {len}");
            assert!(padded.len() > len);
        }
    }

    #[test]
    fn full_block_input_gets_a_whole_pad_block() {
        let padded = pad(vec![1u8; BLOCK_SIZE]);
        assert_eq!(padded.len(), 2 * BLOCK_SIZE);
        assert!(padded[BLOCK_SIZE..].iter().all(|&b| b == 32));
    }

    #[test]
    fn unpad_rejects_out_of_range_pad() {
        let mut buf = vec![0u8; 64];
        *buf.last_mut().unwrap() = 0;
        assert_eq!(unpad(&buf), Err(CryptoError::InvalidPadding));

        *buf.last_mut().unwrap() = 33;
        assert_eq!(unpad(&buf), Err(CryptoError::InvalidPadding));
    }

    #[test]
    fn unpad_rejects_inconsistent_pad() {
        let mut buf = pad(vec![5u8; 10]);
        let n = buf.len();
        buf[n - 2] ^= 0xff;
        assert_eq!(unpad(&buf), Err(CryptoError::InvalidPadding));
    }

    #[test]
    fn identity_mismatch_fails_after_successful_decryption() {
        let ciphertext = encrypt(b"payload", &[0u8; 16], "wx-other", &key(4)).unwrap();
        let err = decrypt(&ciphertext, IdentityCheck::Exact(IDENTITY), &key(4)).unwrap_err();
        assert_eq!(err, CryptoError::IdentityMismatch);
    }

    #[test]
    fn placeholder_identity_only_passes_when_allowed() {
        let ciphertext = encrypt(b"payload", &[0u8; 16], "0", &key(4)).unwrap();

        let strict = decrypt(&ciphertext, IdentityCheck::Exact(IDENTITY), &key(4));
        assert_eq!(strict.unwrap_err(), CryptoError::IdentityMismatch);

        let lenient =
            decrypt(&ciphertext, IdentityCheck::AllowPlaceholder(IDENTITY), &key(4)).unwrap();
        assert!(lenient.has_placeholder_identity());
    }

    #[test]
    fn overrunning_length_prefix_is_rejected() {
        let mut framed = frame(b"abc", &[0u8; 16], IDENTITY).unwrap();
        framed[RANDOM_LEN..HEADER_LEN].copy_from_slice(&1000u32.to_be_bytes());
        let k = key(6);
        let ciphertext = Aes256CbcEnc::new_from_slices(k.as_bytes(), k.iv())
            .unwrap()
            .encrypt_padded_vec_mut::<NoPadding>(&pad(framed));

        let err = decrypt(&ciphertext, IdentityCheck::Exact(IDENTITY), &k).unwrap_err();
        assert_eq!(err, CryptoError::Framing("length prefix overruns buffer"));
    }

    #[test]
    fn misaligned_ciphertext_is_rejected() {
        let err = decrypt(&[0u8; 31], IdentityCheck::Exact(IDENTITY), &key(1)).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidCiphertext(_)));
    }

    #[test]
    fn wrong_key_does_not_yield_plaintext() {
        let ciphertext = encrypt(b"secret", &[8u8; 16], IDENTITY, &key(1)).unwrap();
        assert!(decrypt(&ciphertext, IdentityCheck::Exact(IDENTITY), &key(2)).is_err());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = decrypt_base64("***", IdentityCheck::Exact(IDENTITY), &key(1)).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidCiphertext(_)));
    }
}
