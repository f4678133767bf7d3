//! Background credential renewal
//!
//! One task per coordinator. It sleeps until the current credential's
//! buffered lifetime runs out, refreshes, and re-arms. When any other caller
//! obtains a new credential, its lifetime arrives over a `watch` channel and
//! the task re-arms against that instead, so stopping the old timer and
//! starting the new one never races a tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::coordinator::CredentialCoordinator;

/// Handle to a running renewal loop
///
/// Dropping the handle stops the loop.
#[derive(Debug)]
pub struct RenewalHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RenewalHandle {
    /// Signal the loop to stop; returns immediately.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "credential renewal task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RenewalHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(crate) fn spawn(coordinator: Arc<CredentialCoordinator>) -> RenewalHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(coordinator, cancel.clone()));
    RenewalHandle { cancel, task: Some(task) }
}

async fn run(coordinator: Arc<CredentialCoordinator>, cancel: CancellationToken) {
    let mut lifetimes = coordinator.subscribe_lifetimes();
    let retry_interval = coordinator.settings().retry_interval;

    // A credential fetched before the loop started arms it for whatever
    // lifetime it has left; otherwise refresh right away.
    let mut interval = coordinator.remaining_lifetime().await;
    lifetimes.borrow_and_update();
    let mut deadline = Instant::now() + interval.unwrap_or(Duration::ZERO);

    debug!(scope = coordinator.scope(), ?interval, "credential renewal started");

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = lifetimes.changed() => {
                if changed.is_err() {
                    break;
                }
                let observed = *lifetimes.borrow_and_update();
                if let Some(lifetime) = observed {
                    debug!(
                        scope = coordinator.scope(),
                        lifetime_secs = lifetime.as_secs(),
                        "re-arming renewal after external refresh"
                    );
                    interval = Some(lifetime);
                    deadline = Instant::now() + lifetime;
                }
            }

            () = sleep_until(deadline) => {
                match coordinator.refresh_credential().await {
                    Ok(credential) => {
                        // Our own refresh also lands on the channel.
                        lifetimes.borrow_and_update();
                        let lifetime = Duration::from_secs(credential.expires_in);
                        if interval != Some(lifetime) {
                            info!(
                                scope = coordinator.scope(),
                                lifetime_secs = lifetime.as_secs(),
                                "renewal interval changed"
                            );
                            interval = Some(lifetime);
                        }
                        deadline = Instant::now() + lifetime;
                    }
                    Err(err) => {
                        warn!(
                            scope = coordinator.scope(),
                            error = %err,
                            retry_in_secs = retry_interval.as_secs(),
                            "scheduled credential refresh failed"
                        );
                        deadline = Instant::now() + retry_interval;
                    }
                }
            }
        }
    }

    debug!(scope = coordinator.scope(), "credential renewal stopped");
}
