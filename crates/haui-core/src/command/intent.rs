// ── Panel intents ──
//
// What a touch on the panel means, expressed per widget. Sliders map a
// value on a fixed range to a service call and back again from state;
// buttons read the cached state to decide what to send.

use serde_json::{Value, json};

use super::ServiceCall;
use crate::error::CoreError;
use crate::model::{EntityId, EntityState};
use crate::store::StateCache;

// ── Sliders ─────────────────────────────────────────────────────────

/// The continuous controls a widget can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderKind {
    /// Light brightness, 0..=255. Zero turns the light off.
    Brightness,
    /// Light color temperature in mireds, 200..=400.
    ColorTemp,
    /// Light hue in degrees, 40..=350, at full saturation.
    Hue,
    /// Cover position, 0..=100.
    CoverPosition,
    /// Fan speed percentage, 0..=100.
    FanPercentage,
}

impl SliderKind {
    pub const fn range(self) -> (i64, i64) {
        match self {
            Self::Brightness => (0, 255),
            Self::ColorTemp => (200, 400),
            Self::Hue => (40, 350),
            Self::CoverPosition | Self::FanPercentage => (0, 100),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Brightness => "Brightness",
            Self::ColorTemp => "Temperature",
            Self::Hue => "Hue",
            Self::CoverPosition => "Position",
            Self::FanPercentage => "Speed",
        }
    }

    pub fn clamp(self, value: i64) -> i64 {
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }

    /// Slider position for the given state.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn position(self, state: Option<&EntityState>) -> i64 {
        let attr = |key: &str| state.and_then(|s| s.attribute_f64(key));
        let value = match self {
            Self::Brightness if state.is_some_and(|s| s.state == "off") => 0.0,
            Self::Brightness => attr("brightness").unwrap_or(0.0),
            Self::ColorTemp => attr("color_temp").unwrap_or(300.0),
            Self::Hue => state
                .and_then(|s| s.attribute("hs_color"))
                .and_then(|hs| hs.get(0))
                .and_then(Value::as_f64)
                .unwrap_or(40.0),
            Self::CoverPosition => attr("current_position").unwrap_or(0.0),
            Self::FanPercentage => attr("percentage").unwrap_or(0.0),
        };
        self.clamp(value.round() as i64)
    }

    /// Command for moving this slider on `entity_id` to `value`.
    pub fn command(self, entity_id: EntityId, value: i64) -> Command {
        let value = self.clamp(value);
        match self {
            Self::Brightness => Command::SetBrightness { entity_id, value },
            Self::ColorTemp => Command::SetColorTemp { entity_id, mireds: value },
            Self::Hue => Command::SetHue { entity_id, hue: value },
            Self::CoverPosition => Command::SetCoverPosition { entity_id, position: value },
            Self::FanPercentage => Command::SetFanPercentage { entity_id, percentage: value },
        }
    }
}

// ── Sensors ─────────────────────────────────────────────────────────

/// How a sensor's state is rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Door or window contact: "Open" / "Closed".
    Opening,
    /// Occupancy: "Presence" / "No presence".
    Presence,
    /// The raw state with its unit.
    Value,
}

impl SensorKind {
    /// Pick a rendering from a layout `info_type`.
    pub fn from_info_type(info_type: &str) -> Self {
        let lower = info_type.to_ascii_lowercase();
        if lower.contains("door") || lower.contains("window") {
            Self::Opening
        } else if lower.contains("presence") {
            Self::Presence
        } else {
            Self::Value
        }
    }

    pub fn text(self, state: &EntityState) -> String {
        match self {
            Self::Opening if state.is_on() => "Open".to_owned(),
            Self::Opening => "Closed".to_owned(),
            Self::Presence if state.is_on() => "Presence".to_owned(),
            Self::Presence => "No presence".to_owned(),
            Self::Value => match state.unit() {
                Some(unit) if !state.is_unavailable() => format!("{} {unit}", state.state),
                _ => state.state.clone(),
            },
        }
    }
}

/// A number entity's value rounded for display; the raw state otherwise.
pub fn number_text(state: &EntityState) -> String {
    state
        .state_f64()
        .map_or_else(|| state.state.clone(), |v| format!("{v:.0}"))
}

// ── Commands ────────────────────────────────────────────────────────

/// Direction of a number stepper press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Down,
    Up,
}

impl StepDirection {
    fn sign(self) -> f64 {
        match self {
            Self::Down => -1.0,
            Self::Up => 1.0,
        }
    }
}

/// A typed panel intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetBrightness { entity_id: EntityId, value: i64 },
    SetColorTemp { entity_id: EntityId, mireds: i64 },
    SetHue { entity_id: EntityId, hue: i64 },
    SetCoverPosition { entity_id: EntityId, position: i64 },
    SetFanPercentage { entity_id: EntityId, percentage: i64 },
    /// Flip on/off based on the cached state.
    Toggle { entity_id: EntityId },
    /// Move a number entity one step, clamped to its min/max.
    StepNumber { entity_id: EntityId, direction: StepDirection },
    SelectOption { entity_id: EntityId, option: String },
}

impl Command {
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::SetBrightness { entity_id, .. }
            | Self::SetColorTemp { entity_id, .. }
            | Self::SetHue { entity_id, .. }
            | Self::SetCoverPosition { entity_id, .. }
            | Self::SetFanPercentage { entity_id, .. }
            | Self::Toggle { entity_id }
            | Self::StepNumber { entity_id, .. }
            | Self::SelectOption { entity_id, .. } => entity_id,
        }
    }

    /// Slider commands, which should go through the debouncer.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::SetBrightness { .. }
                | Self::SetColorTemp { .. }
                | Self::SetHue { .. }
                | Self::SetCoverPosition { .. }
                | Self::SetFanPercentage { .. }
        )
    }

    /// Translate into a service call, reading current state where needed.
    pub fn lower(&self, cache: &StateCache) -> Result<ServiceCall, CoreError> {
        let call = match self {
            Self::SetBrightness { entity_id, value } if *value > 0 => {
                ServiceCall::new("light", "turn_on", entity_id.clone()).with("brightness", *value)
            }
            Self::SetBrightness { entity_id, .. } => {
                ServiceCall::new("light", "turn_off", entity_id.clone())
            }
            Self::SetColorTemp { entity_id, mireds } => {
                ServiceCall::new("light", "turn_on", entity_id.clone()).with("color_temp", *mireds)
            }
            Self::SetHue { entity_id, hue } => ServiceCall::new("light", "turn_on", entity_id.clone())
                .with("hs_color", json!([hue, 100])),
            Self::SetCoverPosition { entity_id, position } => {
                ServiceCall::new("cover", "set_cover_position", entity_id.clone())
                    .with("position", *position)
            }
            Self::SetFanPercentage { entity_id, percentage } => {
                ServiceCall::new("fan", "set_percentage", entity_id.clone())
                    .with("percentage", *percentage)
            }
            Self::Toggle { entity_id } => {
                let on = cache.get(entity_id.as_str()).is_some_and(|s| s.is_on());
                let service = if on { "turn_off" } else { "turn_on" };
                ServiceCall::new(entity_id.domain_str(), service, entity_id.clone())
            }
            Self::StepNumber { entity_id, direction } => {
                let value = step_number(cache, entity_id, *direction)?;
                ServiceCall::new("number", "set_value", entity_id.clone()).with("value", value)
            }
            Self::SelectOption { entity_id, option } => {
                ServiceCall::new("select", "select_option", entity_id.clone())
                    .with("option", option.as_str())
            }
        };
        Ok(call)
    }
}

fn step_number(
    cache: &StateCache,
    entity_id: &EntityId,
    direction: StepDirection,
) -> Result<f64, CoreError> {
    let state = cache
        .get(entity_id.as_str())
        .ok_or_else(|| CoreError::EntityNotFound {
            entity_id: entity_id.to_string(),
        })?;

    let current = state.state_f64().ok_or_else(|| CoreError::InvalidValue {
        message: format!("{entity_id} has non-numeric state {:?}", state.state),
    })?;
    let attr = |key: &str, default: f64| -> Result<f64, CoreError> {
        match state.attribute(key) {
            None => Ok(default),
            Some(_) => state.attribute_f64(key).ok_or_else(|| CoreError::InvalidValue {
                message: format!("{entity_id} has non-numeric {key}"),
            }),
        }
    };
    let step = attr("step", 1.0)?;
    let min = attr("min", 0.0)?;
    let max = attr("max", 100.0)?;

    Ok((current + direction.sign() * step).max(min).min(max))
}
