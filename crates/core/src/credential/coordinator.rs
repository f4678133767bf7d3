//! Credential refresh coordinator
//!
//! All refreshes for one scope serialize through a single async mutex. Inside
//! it, a successful fetch younger than the convergence window is reused
//! instead of calling upstream again, so a burst of concurrent refreshes
//! produces exactly one fetch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_common::{Clock, SystemClock};
use courier_domain::constants::{DEFAULT_CONVERGENCE_WINDOW_SECS, DEFAULT_RETRY_INTERVAL_SECS};
use courier_domain::{Credential, Result, SdkConfig};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::ports::{CredentialFetcher, CredentialSource};
use super::renewal::{self, RenewalHandle};
use super::store::CredentialStore;

/// Timing knobs for a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Refreshes within this long of a successful fetch reuse its result
    pub convergence_window: Duration,
    /// Back-off before the renewal loop retries a failed refresh
    pub retry_interval: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            convergence_window: Duration::from_secs(DEFAULT_CONVERGENCE_WINDOW_SECS),
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
        }
    }
}

impl CoordinatorSettings {
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            convergence_window: config.convergence_window(),
            retry_interval: config.retry_interval(),
        }
    }
}

/// Last successful upstream fetch, guarded by the refresh lock
#[derive(Debug)]
struct LastFetch {
    completed_at: Instant,
    credential: Credential,
}

/// Caches and refreshes the bearer credential for one account
///
/// Construct one per account and share it behind an `Arc`.
pub struct CredentialCoordinator {
    scope: String,
    fetcher: Arc<dyn CredentialFetcher>,
    clock: Arc<dyn Clock>,
    settings: CoordinatorSettings,
    store: CredentialStore,
    refresh_lock: Mutex<Option<LastFetch>>,
    lifetime_tx: watch::Sender<Option<Duration>>,
}

impl CredentialCoordinator {
    /// Coordinator with default settings and the system clock.
    pub fn new(fetcher: Arc<dyn CredentialFetcher>) -> Self {
        let (lifetime_tx, _) = watch::channel(None);
        Self {
            scope: "default".to_string(),
            fetcher,
            clock: Arc::new(SystemClock),
            settings: CoordinatorSettings::default(),
            store: CredentialStore::new(),
            refresh_lock: Mutex::new(None),
            lifetime_tx,
        }
    }

    /// Coordinator for the account described by `config`.
    ///
    /// # Errors
    ///
    /// Returns the validation error when `config` is invalid.
    pub fn from_config(config: &SdkConfig, fetcher: Arc<dyn CredentialFetcher>) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(fetcher)
            .with_scope(config.app_id.clone())
            .with_settings(CoordinatorSettings::from_config(config)))
    }

    /// Name used in log events (usually the app id).
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.settings
    }

    /// Cached credential value, or a fresh one if nothing usable is cached.
    ///
    /// A cached credential whose buffered lifetime has run out counts as
    /// absent.
    pub async fn get_credential(&self) -> Result<String> {
        if let Some(credential) = self.store.get().await {
            if !credential.is_expired_at(self.wall_clock()) {
                return Ok(credential.value().to_string());
            }
            debug!(scope = %self.scope, "cached credential past its buffered lifetime");
        }
        self.refresh_credential().await.map(|credential| credential.value().to_string())
    }

    /// Forced refresh, coalesced with any fetch inside the convergence window.
    ///
    /// # Errors
    ///
    /// Any fetch or expiry-policy failure; the cache is cleared first.
    pub async fn refresh_credential(&self) -> Result<Credential> {
        let mut last = self.refresh_lock.lock().await;
        if let Some(reused) = self.coalesce(last.as_ref()) {
            debug!(
                scope = %self.scope,
                expires_in = reused.expires_in,
                "reusing credential fetched inside convergence window"
            );
            return Ok(reused);
        }
        self.fetch_locked(&mut last).await
    }

    /// Replace `stale` unless another caller already has.
    ///
    /// When the cache still holds `stale` the fetch bypasses the convergence
    /// window: the platform has just rejected that exact value.
    pub async fn refresh_credential_if_current(&self, stale: &str) -> Result<String> {
        let mut last = self.refresh_lock.lock().await;
        if let Some(current) = self.store.get().await {
            if current.value() != stale {
                debug!(scope = %self.scope, "credential already replaced by another caller");
                return Ok(current.value().to_string());
            }
        }
        self.fetch_locked(&mut last).await.map(|credential| credential.value().to_string())
    }

    /// Cached credential without refreshing.
    pub async fn cached(&self) -> Option<Credential> {
        self.store.get().await
    }

    /// Time left on the cached credential by this coordinator's clock, if any.
    pub(crate) async fn remaining_lifetime(&self) -> Option<Duration> {
        let credential = self.store.get().await?;
        Some(credential.remaining_at(self.wall_clock()))
    }

    /// Start the background renewal loop for this scope.
    pub fn spawn_renewal(self: &Arc<Self>) -> RenewalHandle {
        renewal::spawn(Arc::clone(self))
    }

    pub(crate) fn subscribe_lifetimes(&self) -> watch::Receiver<Option<Duration>> {
        self.lifetime_tx.subscribe()
    }

    fn coalesce(&self, last: Option<&LastFetch>) -> Option<Credential> {
        let last = last?;
        let elapsed = self.clock.now().saturating_duration_since(last.completed_at);
        (elapsed < self.settings.convergence_window)
            .then(|| last.credential.aged(elapsed.as_secs()))
    }

    async fn fetch_locked(&self, last: &mut Option<LastFetch>) -> Result<Credential> {
        let outcome = self
            .fetcher
            .fetch()
            .await
            .and_then(|fetched| Credential::from_fetched(fetched, self.wall_clock()));

        match outcome {
            Ok(credential) => {
                self.store.set(credential.clone()).await;
                *last = Some(LastFetch {
                    completed_at: self.clock.now(),
                    credential: credential.clone(),
                });
                self.lifetime_tx.send_replace(Some(Duration::from_secs(credential.expires_in)));
                info!(
                    scope = %self.scope,
                    expires_in = credential.expires_in,
                    "fetched new credential"
                );
                Ok(credential)
            }
            Err(err) => {
                self.store.clear().await;
                *last = None;
                warn!(scope = %self.scope, error = %err, "credential refresh failed");
                Err(err)
            }
        }
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }
}

#[async_trait]
impl CredentialSource for CredentialCoordinator {
    async fn get_credential(&self) -> Result<String> {
        CredentialCoordinator::get_credential(self).await
    }

    async fn refresh_credential_if_current(&self, stale: &str) -> Result<String> {
        CredentialCoordinator::refresh_credential_if_current(self, stale).await
    }
}
