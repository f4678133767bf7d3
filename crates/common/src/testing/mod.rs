//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: deterministic keys, handshake vectors and platform XML
//!   bodies
//! - **[`async_utils`]**: async wait helpers (requires `runtime`)
//!
//! ## Usage
//!
//! ```rust
//! use courier_common::testing::fixtures;
//!
//! let key = fixtures::seeded_key(7);
//! assert_eq!(key.as_bytes(), fixtures::seeded_key(7).as_bytes());
//! ```

#[cfg(feature = "runtime")]
pub mod async_utils;
pub mod fixtures;

#[cfg(feature = "runtime")]
pub use async_utils::{poll_until, timeout_ok};
pub use fixtures::{seeded_key, seeded_random, text_message_xml};
