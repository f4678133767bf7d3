//! Platform API access
//!
//! - [`HttpCredentialFetcher`]: obtains bearer credentials from the token
//!   endpoint
//! - [`ApiClient`]: authenticated JSON calls with the refresh-and-retry-once
//!   rule for rejected credentials

pub mod client;
pub mod credential;
pub mod errors;

pub use client::{ApiClient, ApiClientConfig};
pub use credential::HttpCredentialFetcher;
pub use errors::ApiError;
