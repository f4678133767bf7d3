//! Waiting on state owned by another task
//!
//! Renewal and coalescing tests observe effects of spawned tasks. These
//! helpers use tokio's clock, so they also work under `start_paused`.

use std::future::Future;
use std::time::Duration;

use tokio::time::{error::Elapsed, sleep, timeout, Instant};

/// Run `fut`, failing with [`Elapsed`] if it takes longer than `limit`.
///
/// ```no_run
/// # async fn demo() {
/// use std::time::Duration;
/// use courier_common::testing::timeout_ok;
///
/// let value = timeout_ok(Duration::from_millis(100), async { 42 }).await;
/// assert_eq!(value.ok(), Some(42));
/// # }
/// ```
pub async fn timeout_ok<F, T>(limit: Duration, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    timeout(limit, fut).await
}

/// Re-check `condition` every `interval` until it holds or `limit` passes.
///
/// Returns the last observed value of the condition.
pub async fn poll_until<F, Fut>(limit: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + limit;
    loop {
        if condition().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(interval).await;
    }
}
