// ── Domain model ──

pub mod entity;
pub mod entity_id;
pub mod history;

pub use entity::EntityState;
pub use entity_id::{Domain, EntityId, InvalidEntityId};
pub use history::{HistoryPoint, HistorySeries};
