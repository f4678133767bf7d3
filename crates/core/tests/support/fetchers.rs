use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::CredentialFetcher;
use courier_domain::{FetchedCredential, Result as DomainResult};

/// Fetcher that replays a script of responses.
///
/// Once the script runs dry, every further call repeats the last entry. An
/// optional delay makes each fetch slow enough for concurrent callers to
/// pile up behind the refresh lock.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<DomainResult<FetchedCredential>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<DomainResult<FetchedCredential>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<DomainResult<FetchedCredential>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script.into()), delay, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialFetcher for ScriptedFetcher {
    async fn fetch(&self) -> DomainResult<FetchedCredential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().expect("script must not be empty")
        }
    }
}

/// Fetcher that hands out a new value on every call.
pub struct CountingFetcher {
    expires_in: u64,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingFetcher {
    /// Fetcher that always succeeds with numbered values (`cred-1`, ...).
    pub fn new(expires_in: u64, delay: Duration) -> Arc<Self> {
        Arc::new(Self { expires_in, delay, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialFetcher for CountingFetcher {
    async fn fetch(&self) -> DomainResult<FetchedCredential> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(FetchedCredential::new(format!("cred-{n}"), self.expires_in))
    }
}

pub fn ok(value: &str, expires_in: u64) -> DomainResult<FetchedCredential> {
    Ok(FetchedCredential::new(value, expires_in))
}
