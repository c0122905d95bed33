//! State-synchronization layer between `haui-api` and UI consumers (CLI / panel).
//!
//! - **[`HubClient`]**: owns the connection lifecycle. [`connect()`](HubClient::connect)
//!   opens a session in the background, authenticates, subscribes to state
//!   changes and requests a full snapshot. Disconnects are retried after a
//!   fixed delay by the [`ReconnectPolicy`].
//!
//! - **[`StateCache`]**: concurrent map of entity id to last known state,
//!   fed by the [`Reconciler`] from snapshots and incremental events. Every
//!   write is announced as a [`HubEvent`] on the client's update channel.
//!
//! - **[`Command`]** / **[`ServiceCall`]**: panel intents and the service
//!   invocations they lower to. Slider commands pass through the
//!   [`Debouncer`] so only the final value of a drag is sent.
//!
//! - **[`HistoryClient`]**: REST access to sensor history, converted to a
//!   plottable [`HistorySeries`].

pub mod command;
pub mod config;
pub mod controller;
pub mod correlation;
pub mod debounce;
pub mod error;
pub mod event;
pub mod history;
pub mod model;
pub mod reconnect;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, SensorKind, ServiceCall, SliderKind, StepDirection};
pub use config::HubConfig;
pub use controller::{ConnectionState, HubClient};
pub use correlation::{Correlator, RequestKind};
pub use debounce::Debouncer;
pub use error::CoreError;
pub use event::HubEvent;
pub use history::HistoryClient;
pub use model::{Domain, EntityId, EntityState, HistoryPoint, HistorySeries};
pub use reconnect::{PolicyState, ReconnectPolicy};
pub use store::{Reconciler, StateCache};

pub use haui_api::StateRecord;
