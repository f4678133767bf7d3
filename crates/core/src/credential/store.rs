//! Shared credential cache slot

use courier_domain::Credential;
use tokio::sync::RwLock;

/// Holds the most recent credential for one scope
///
/// Readers take a shared lock; only the coordinator writes, and only while
/// holding its refresh lock.
#[derive(Debug, Default)]
pub struct CredentialStore {
    slot: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached credential.
    pub async fn get(&self) -> Option<Credential> {
        self.slot.read().await.clone()
    }

    pub async fn set(&self, credential: Credential) {
        *self.slot.write().await = Some(credential);
    }

    /// Drop the cached credential; the next read triggers a fetch.
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}
