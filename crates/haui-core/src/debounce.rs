// ── Per-entity debouncing ──
//
// Slider drags produce a burst of values. Only the last one should reach
// the hub, and only once the user has stopped moving for a moment.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::model::EntityId;

struct PendingAction {
    generation: u64,
    timer: Option<AbortHandle>,
}

/// Delays actions per entity, keeping only the latest.
///
/// At most one action is pending per entity; scheduling another cancels
/// and replaces it. Different entities never affect each other.
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
    pending: Arc<DashMap<EntityId, PendingAction>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Run `action` after the quiet period unless superseded first.
    pub fn schedule<F>(&self, entity_id: EntityId, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        // Register before spawning so the timer always finds its entry.
        let previous = self.pending.insert(
            entity_id.clone(),
            PendingAction {
                generation,
                timer: None,
            },
        );
        if let Some(timer) = previous.and_then(|p| p.timer) {
            timer.abort();
        }

        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let key = entity_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if pending
                .remove_if(&key, |_, p| p.generation == generation)
                .is_some()
            {
                trace!(entity_id = %key, "debounce fired");
                action();
            }
        });

        if let Some(mut entry) = self.pending.get_mut(&entity_id) {
            if entry.generation == generation {
                entry.timer = Some(handle.abort_handle());
            }
        }
    }

    /// Number of entities with an action waiting.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, entity_id: &str) -> bool {
        self.pending.contains_key(entity_id)
    }

    /// Drop every waiting action without running it.
    pub fn cancel_all(&self) {
        self.pending.retain(|_, p| {
            if let Some(timer) = p.timer.take() {
                timer.abort();
            }
            false
        });
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<(String, u32)>>>;

    fn record(log: &Log, entity: &str, value: u32) -> impl FnOnce() + Send + 'static {
        let log = Arc::clone(log);
        let entity = entity.to_owned();
        move || log.lock().unwrap().push((entity, value))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_value() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let log: Log = Arc::default();

        for value in [10, 50, 120, 180] {
            debouncer.schedule("light.kitchen".into(), record(&log, "light.kitchen", value));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*log.lock().unwrap(), vec![("light.kitchen".to_owned(), 180)]);
        assert_eq!(debouncer.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entities_debounce_independently() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let log: Log = Arc::default();

        debouncer.schedule("light.a".into(), record(&log, "light.a", 1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule("cover.b".into(), record(&log, "cover.b", 2));
        assert_eq!(debouncer.pending_len(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*log.lock().unwrap(), vec![("light.a".to_owned(), 1)]);
        assert!(debouncer.is_pending("cover.b"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_restarts_on_each_schedule() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let log: Log = Arc::default();

        debouncer.schedule("fan.x".into(), record(&log, "fan.x", 1));
        tokio::time::sleep(Duration::from_millis(290)).await;
        debouncer.schedule("fan.x".into(), record(&log, "fan.x", 2));
        tokio::time::sleep(Duration::from_millis(290)).await;
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*log.lock().unwrap(), vec![("fan.x".to_owned(), 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_drops_pending() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let log: Log = Arc::default();

        debouncer.schedule("light.a".into(), record(&log, "light.a", 1));
        debouncer.cancel_all();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(debouncer.pending_len(), 0);
    }
}
