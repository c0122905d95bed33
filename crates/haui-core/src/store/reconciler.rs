// ── Snapshot / event reconciliation ──
//
// Feeds the cache from two sources: incremental `state_changed` events and
// full `get_states` snapshots. The subscription is opened before the
// snapshot is requested, so an event can arrive while the snapshot is in
// flight. Such an event is newer than the snapshot's copy of that entity,
// and the snapshot entry is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use haui_api::StateChangedData;
use serde_json::Value;
use tracing::{debug, trace};

use crate::model::{EntityId, EntityState};
use crate::store::StateCache;

/// Position in the event stream at which a snapshot was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMark(u64);

/// Per-session reconciler. Owned by the client's driver task.
pub struct Reconciler {
    cache: Arc<StateCache>,
    /// Count of events applied so far this session.
    event_seq: u64,
    /// Sequence number of the latest event seen for each entity.
    last_event: HashMap<EntityId, u64>,
}

impl Reconciler {
    pub fn new(cache: Arc<StateCache>) -> Self {
        Self {
            cache,
            event_seq: 0,
            last_event: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<StateCache> {
        &self.cache
    }

    /// Record the current position before requesting a snapshot.
    pub fn begin_snapshot(&self) -> SnapshotMark {
        SnapshotMark(self.event_seq)
    }

    /// Apply one `state_changed` event. Returns whether the cache changed.
    ///
    /// A `null` new state (entity removed) is ignored.
    pub fn apply_event(&mut self, data: StateChangedData) -> bool {
        let Some(new_state) = data.new_state else {
            debug!(entity_id = %data.entity_id, "ignoring event without new_state");
            return false;
        };
        let state = match serde_json::from_value::<EntityState>(new_state) {
            Ok(s) => s,
            Err(e) => {
                debug!(entity_id = %data.entity_id, error = %e, "malformed new_state");
                return false;
            }
        };

        let entity_id = EntityId::from(data.entity_id);
        self.event_seq += 1;
        self.last_event.insert(entity_id.clone(), self.event_seq);
        self.cache.apply(entity_id, state);
        true
    }

    /// Apply the payload of a successful `result`.
    ///
    /// Accepts a single state object or a list of them; anything without an
    /// `entity_id` is skipped. With a `mark`, entries for entities that
    /// received an event after the mark are skipped as stale.
    pub fn apply_result(&mut self, result: Value, mark: Option<SnapshotMark>) -> usize {
        let items = match result {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            _ => return 0,
        };

        let updates: Vec<(EntityId, EntityState)> = items
            .into_iter()
            .filter_map(|item| self.entity_from_value(item, mark))
            .collect();

        self.cache.apply_all(updates)
    }

    fn entity_from_value(&self, item: Value, mark: Option<SnapshotMark>) -> Option<(EntityId, EntityState)> {
        let entity_id = EntityId::from(item.get("entity_id")?.as_str()?);

        if let Some(SnapshotMark(requested_at)) = mark {
            if self.last_event.get(&entity_id).is_some_and(|&seq| seq > requested_at) {
                trace!(%entity_id, "snapshot entry older than live event, skipping");
                return None;
            }
        }

        match serde_json::from_value::<EntityState>(item) {
            Ok(state) => Some((entity_id, state)),
            Err(e) => {
                debug!(%entity_id, error = %e, "malformed state in result");
                None
            }
        }
    }
}
