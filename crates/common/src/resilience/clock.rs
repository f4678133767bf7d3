//! Monotonic and wall-clock time behind one trait

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of time for window and expiry decisions.
///
/// `now` drives elapsed-time comparisons such as the convergence window;
/// `system_time` only stamps records for display and logging.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn system_time(&self) -> SystemTime;
}

/// Operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        T::now(self)
    }

    fn system_time(&self) -> SystemTime {
        T::system_time(self)
    }
}

/// Wall time reported by a fresh [`MockClock`] (2023-11-14T22:13:20Z).
pub const MOCK_EPOCH_SECS: u64 = 1_700_000_000;

/// Manually advanced clock.
///
/// Time only moves when a test calls [`advance`](Self::advance). Clones share
/// one offset, so the component under test can hold one clone while the test
/// drives another.
#[derive(Debug, Clone)]
pub struct MockClock {
    origin: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { origin: Instant::now(), offset_nanos: Arc::new(AtomicU64::new(0)) }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Total time advanced since construction.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(MOCK_EPOCH_SECS) + self.elapsed()
    }
}
