//! # Courier Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client with timeout and bounded retry
//! - The token-endpoint credential fetcher
//! - The authenticated platform API client
//! - Configuration loading (environment, `.env`, TOML, JSON)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `courier-core`
//! - Depends on `courier-common`, `courier-domain` and `courier-core`
//! - Contains all "impure" code (network I/O, files, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientConfig, ApiError, HttpCredentialFetcher};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, TracingFormat};
