//! Port interfaces for credential handling
//!
//! These traits define the boundaries between the coordinator and the
//! infrastructure that talks to the platform.

use async_trait::async_trait;
use courier_domain::{FetchedCredential, Result};

/// Obtains a fresh credential from the platform's token endpoint
#[async_trait]
pub trait CredentialFetcher: Send + Sync {
    /// Perform one upstream fetch
    async fn fetch(&self) -> Result<FetchedCredential>;
}

/// What outbound API clients need from the credential layer
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current credential value, fetching one if none is cached
    async fn get_credential(&self) -> Result<String>;

    /// Replace `stale` after the platform rejected it
    ///
    /// Returns the cached value without fetching when another caller has
    /// already replaced `stale`.
    async fn refresh_credential_if_current(&self, stale: &str) -> Result<String>;
}
