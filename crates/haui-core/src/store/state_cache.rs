// ── Entity state cache ──
//
// Authoritative local mirror of every entity the hub has reported.
// Writes come only from the client's driver task; reads come from anywhere.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};

use crate::event::HubEvent;
use crate::model::{Domain, EntityId, EntityState};

/// Sorted `(id, state)` pairs, shared with subscribers.
pub type Snapshot = Arc<Vec<(EntityId, Arc<EntityState>)>>;

/// Concurrent map of entity id to last known state.
///
/// Every [`apply`](Self::apply) replaces the entry wholesale (no attribute
/// merging) and emits a [`HubEvent::StateChanged`] on the update channel.
/// A `watch` snapshot is rebuilt after each write for consumers that
/// prefer polling the whole set.
pub struct StateCache {
    entries: DashMap<EntityId, Arc<EntityState>>,
    snapshot: watch::Sender<Snapshot>,
    updates: mpsc::UnboundedSender<HubEvent>,
}

impl StateCache {
    pub fn new(updates: mpsc::UnboundedSender<HubEvent>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            entries: DashMap::new(),
            snapshot,
            updates,
        }
    }

    /// Overwrite the entry for `entity_id` and emit the update.
    pub fn apply(&self, entity_id: EntityId, state: EntityState) {
        self.insert_and_emit(entity_id, state);
        self.rebuild_snapshot();
    }

    /// Apply several updates, emitting one event each but rebuilding the
    /// snapshot once. Returns the number applied.
    pub fn apply_all(&self, updates: impl IntoIterator<Item = (EntityId, EntityState)>) -> usize {
        let mut count = 0;
        for (entity_id, state) in updates {
            self.insert_and_emit(entity_id, state);
            count += 1;
        }
        if count > 0 {
            self.rebuild_snapshot();
        }
        count
    }

    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityState>> {
        self.entries.get(entity_id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entries.contains_key(entity_id)
    }

    /// Current snapshot, sorted by entity id (cheap `Arc` clone).
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// All entries in `domain`, sorted by entity id.
    pub fn by_domain(&self, domain: &Domain) -> Vec<(EntityId, Arc<EntityState>)> {
        self.snapshot()
            .iter()
            .filter(|(id, _)| id.domain() == *domain)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn insert_and_emit(&self, entity_id: EntityId, state: EntityState) {
        let state = Arc::new(state);
        self.entries.insert(entity_id.clone(), Arc::clone(&state));
        // The receiver may be gone during shutdown.
        let _ = self.updates.send(HubEvent::StateChanged { entity_id, state });
    }

    fn rebuild_snapshot(&self) {
        let mut values: Vec<(EntityId, Arc<EntityState>)> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
