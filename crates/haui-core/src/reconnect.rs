// ── Reconnection policy ──
//
// Fixed-delay, single-shot retry. A disconnect arms one timer; when it
// fires the policy reconnects only if the session is still down, then goes
// back to idle. A failed attempt produces another disconnect, which arms
// the timer again, so retries continue indefinitely at the same pace.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Whether a reconnect timer is currently armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    Idle,
    Active,
}

/// Fixed-delay reconnect scheduler.
#[derive(Debug)]
pub struct ReconnectPolicy {
    delay: Duration,
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, cancel: CancellationToken) -> Self {
        Self {
            delay,
            active: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    pub fn state(&self) -> PolicyState {
        if self.active.load(Ordering::Acquire) {
            PolicyState::Active
        } else {
            PolicyState::Idle
        }
    }

    /// Handle a disconnect. Arms the timer unless one is already armed.
    ///
    /// When the timer fires, `is_connected` is checked; `reconnect` runs
    /// only if it returns `false`. The policy is idle again before
    /// `reconnect` runs, so a disconnect caused by that attempt re-arms it.
    pub fn on_disconnect<C, R>(&self, is_connected: C, reconnect: R)
    where
        C: FnOnce() -> bool + Send + 'static,
        R: FnOnce() + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return;
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("reconnect already scheduled");
            return;
        }

        let delay = self.delay;
        let active = Arc::clone(&self.active);
        let cancel = self.cancel.clone();
        info!(delay_secs = delay.as_secs(), "scheduling reconnect");

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    active.store(false, Ordering::Release);
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }

            active.store(false, Ordering::Release);
            if is_connected() {
                debug!("already reconnected, skipping attempt");
            } else {
                info!("attempting reconnect");
                reconnect();
            }
        });
    }
}
