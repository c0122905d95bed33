// ── Hub events ──
//
// Everything the background tasks want the UI to know travels through one
// unbounded channel of `HubEvent`. The UI drains it on its own loop.

use std::sync::Arc;

use crate::model::{EntityId, EntityState};

/// Notification delivered from the client's background tasks to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// An entity's cached state was replaced.
    StateChanged {
        entity_id: EntityId,
        state: Arc<EntityState>,
    },

    /// The socket opened; authentication is in progress.
    Connected,

    /// The hub accepted the access token.
    Authenticated,

    /// A full-state snapshot finished applying.
    SnapshotApplied { count: usize },

    /// The session ended. Emitted once per transition to disconnected.
    Disconnected,

    /// The hub rejected the access token.
    AuthRejected { message: String },

    /// A service call was acknowledged.
    CommandCompleted { id: u64 },

    /// A service call was rejected by the hub.
    CommandFailed {
        id: u64,
        code: Option<String>,
        message: String,
    },
}
