//! Cryptographic primitives for platform callbacks.
//!
//! - [`envelope`]: AES-256-CBC envelope with 32-byte PKCS#7 padding and the
//!   random/length/payload/identity framing
//! - [`signature`]: sorted-input SHA-1 signatures and constant-time checks
//! - [`keys`]: AES keys (including the platform's 43 character encoding) and
//!   the current/previous rotation pair
//!
//! Higher-level orchestration (key fallback, request verification) lives in
//! `courier-core::callback`.
//!
//! ## Usage
//!
//! ```rust
//! use courier_common::crypto::envelope::{self, IdentityCheck};
//! use courier_common::crypto::AesKey;
//!
//! let key = AesKey::generate();
//! let random = envelope::generate_random();
//! let sealed = envelope::encrypt_to_base64(b"<xml/>", &random, "wx-app", &key)?;
//! let opened = envelope::decrypt_base64(&sealed, IdentityCheck::Exact("wx-app"), &key)?;
//! assert_eq!(opened.payload, b"<xml/>");
//! # Ok::<(), courier_common::crypto::CryptoError>(())
//! ```

pub mod envelope;
pub mod error;
pub mod keys;
pub mod signature;

pub use envelope::{DecryptedEnvelope, IdentityCheck};
pub use error::{CryptoError, CryptoResult};
pub use keys::{AesKey, KeyRing};
pub use signature::{
    constant_time_eq, sign, sign_handshake, sign_message, ConstantTimeComparator,
    SignatureVerifier, SubtleComparator, SIGNATURE_LEN,
};
