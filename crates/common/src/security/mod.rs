//! Secret handling for SDK credentials
//!
//! Application secrets, callback tokens and encoded AES keys are loaded into
//! [`SecretString`] so they are zeroed on drop and never rendered by `Debug`
//! or `Display`.

pub mod secret;

pub use secret::SecretString;
