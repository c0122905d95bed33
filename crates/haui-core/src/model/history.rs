// ── Sensor history series ──
//
// Converts raw history rows into plottable points. Two shapes exist:
// numeric sensors plot their value, binary sensors (doors, windows,
// motion) plot 1 for open/on and 0 for closed/off.

use chrono::{DateTime, Utc};
use haui_api::StateRecord;
use serde::Serialize;
use serde_json::{Map, Value};

use super::entity_id::{Domain, EntityId};

/// Device classes that are drawn as open/closed steps.
const BINARY_DEVICE_CLASSES: &[&str] = &["window", "door", "opening"];

/// One plotted sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// A time series ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySeries {
    pub entity_id: EntityId,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub binary: bool,
    pub points: Vec<HistoryPoint>,
}

impl HistorySeries {
    /// Build a series from history rows.
    ///
    /// `attributes` are the entity's current attributes, used to pick the
    /// binary/numeric shape and the label. Rows without a timestamp or with
    /// an unplottable state (`unavailable`, `unknown`, ...) are skipped.
    pub fn from_rows(
        entity_id: EntityId,
        attributes: &Map<String, Value>,
        rows: &[StateRecord],
    ) -> Self {
        let binary = is_binary(&entity_id, attributes);

        let points = rows
            .iter()
            .filter_map(|row| {
                let at = row.last_updated.or(row.last_changed)?;
                let value = if binary {
                    binary_value(&row.state)?
                } else {
                    row.state.trim().parse::<f64>().ok().filter(|v| v.is_finite())?
                };
                Some(HistoryPoint { at, value })
            })
            .collect();

        Self {
            name: attributes
                .get("friendly_name")
                .and_then(Value::as_str)
                .map(str::to_owned),
            unit: attributes
                .get("unit_of_measurement")
                .and_then(Value::as_str)
                .map(str::to_owned),
            entity_id,
            binary,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(min, max)` of the plotted values.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.value);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }
}

/// Whether an entity is charted as a binary open/closed series.
pub fn is_binary(entity_id: &EntityId, attributes: &Map<String, Value>) -> bool {
    entity_id.domain() == Domain::BinarySensor
        || attributes
            .get("device_class")
            .and_then(Value::as_str)
            .is_some_and(|dc| BINARY_DEVICE_CLASSES.contains(&dc))
}

fn binary_value(state: &str) -> Option<f64> {
    match state.to_ascii_lowercase().as_str() {
        "on" | "open" => Some(1.0),
        "off" | "closed" => Some(0.0),
        _ => None,
    }
}
