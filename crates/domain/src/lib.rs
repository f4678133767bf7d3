//! # Courier Domain
//!
//! Business domain types and models for the Courier SDK.
//!
//! This crate contains:
//! - Credential model and the expiry buffering policy
//! - SDK configuration and its validation rules
//! - Platform message and callback wire types (XML)
//! - The typed JSON API envelope
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - Depends only on the foundation tier of `courier-common`
//! - No I/O, no async runtime
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
