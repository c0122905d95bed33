// ── State storage ──

mod reconciler;
mod state_cache;

pub use reconciler::{Reconciler, SnapshotMark};
pub use state_cache::{Snapshot, StateCache};
