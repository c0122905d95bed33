//! Data bridge: connects a [`HubClient`] to the panel's action loop.
//!
//! Starts the client, then forwards every [`HubEvent`] and connection-state
//! transition as an [`Action`] until cancelled. The client's own tasks
//! never touch panel state; everything crosses over here.

use haui_core::{HubClient, HubEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::action::{Action, Notification};

pub async fn spawn_data_bridge(
    client: HubClient,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let Some(mut events) = client.take_events() else {
        warn!("hub event channel already taken, panel will not update");
        return;
    };
    let mut conn_state = client.connection_state();

    client.connect();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = conn_state.changed() => {
                let state = *conn_state.borrow_and_update();
                let _ = action_tx.send(Action::ConnectionChanged(state));
            }

            event = events.recv() => {
                let Some(event) = event else { break };
                if let Some(action) = to_action(event) {
                    let _ = action_tx.send(action);
                }
            }
        }
    }

    client.shutdown();
    debug!("data bridge shut down");
}

/// Map a hub event onto the panel's vocabulary. Lifecycle events are
/// covered by the connection-state watch and produce nothing here.
pub fn to_action(event: HubEvent) -> Option<Action> {
    match event {
        HubEvent::StateChanged { entity_id, state } => {
            Some(Action::StateChanged { entity_id, state })
        }
        HubEvent::SnapshotApplied { count } => Some(Action::SnapshotApplied(count)),
        HubEvent::AuthRejected { message } => Some(Action::Notify(Notification::error(
            format!("Access token rejected: {message}"),
        ))),
        HubEvent::CommandFailed { id, code, message } => {
            warn!(id, ?code, %message, "service call failed");
            Some(Action::Notify(Notification::error(message)))
        }
        HubEvent::CommandCompleted { id } => {
            debug!(id, "service call completed");
            None
        }
        HubEvent::Connected | HubEvent::Authenticated | HubEvent::Disconnected => None,
    }
}
