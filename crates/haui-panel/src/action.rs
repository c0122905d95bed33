//! Everything that changes panel state is an [`Action`].

use std::sync::Arc;

use haui_core::{Command, ConnectionState, EntityId, EntityState, HistorySeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A short-lived toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Hub data ──
    StateChanged {
        entity_id: EntityId,
        state: Arc<EntityState>,
    },
    SnapshotApplied(usize),
    ConnectionChanged(ConnectionState),

    // ── Navigation ──
    SelectGroup(usize),
    ToggleHelp,

    // ── Controls ──
    /// Send a panel command; sliders are debounced by the client.
    Send(Command),

    // ── History chart ──
    OpenChart(EntityId),
    CloseChart,
    RefreshChart,
    ChartLoaded(Arc<HistorySeries>),
    ChartFailed(String),

    // ── Notifications ──
    Notify(Notification),
    DismissNotification,
}
