//! Modular common utilities shared across Courier crates.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards: no unsafe code,
//! no panics on malformed input, and constant-time comparison wherever a
//! presented value is checked against a secret-derived one.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, crypto primitives (callback envelope cipher,
//!   signatures, key ring), secrets, clock abstraction
//! - `runtime`: async helpers built on tokio
//! - `test-utils`: deterministic fixtures and async wait helpers for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod crypto;
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod resilience;
#[cfg(feature = "foundation")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "foundation", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use crypto::{
    AesKey, ConstantTimeComparator, CryptoError, CryptoResult, DecryptedEnvelope, IdentityCheck,
    KeyRing, SignatureVerifier, SubtleComparator,
};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "foundation")]
pub use resilience::{Clock, MockClock, SystemClock};
#[cfg(feature = "foundation")]
pub use security::SecretString;
