// ── Panel layout ──
//
// The layout file is a JSON object of group name to a list of entries.
// Group order in the file is the display order.

use std::path::Path;

use haui_core::{EntityId, SensorKind, SliderKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ConfigError;

/// Which control an entry renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    Light,
    Switch,
    Cover,
    Fan,
    Number,
    SensorChart,
    Sensor,
    BinarySensor,
    Select,
    /// Anything newer than this build; shown as a plain label.
    #[serde(other)]
    Unknown,
}

impl WidgetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Switch => "switch",
            Self::Cover => "cover",
            Self::Fan => "fan",
            Self::Number => "number",
            Self::SensorChart => "sensor_chart",
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Select => "select",
            Self::Unknown => "unknown",
        }
    }
}

/// One row of the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub entity_id: EntityId,
    pub widget_type: WidgetType,
    /// Free-form hint refining the widget (`temp`, `window`, `presence`, ...).
    #[serde(default)]
    pub info_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl LayoutEntry {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.entity_id.as_str())
    }

    /// Sliders shown for this entry, in display order.
    pub fn sliders(&self) -> Vec<SliderKind> {
        match self.widget_type {
            WidgetType::Light => match self.info_type.as_str() {
                "temp" => vec![SliderKind::Brightness, SliderKind::ColorTemp],
                "temp_color" => vec![
                    SliderKind::Brightness,
                    SliderKind::ColorTemp,
                    SliderKind::Hue,
                ],
                _ => vec![SliderKind::Brightness],
            },
            WidgetType::Cover => vec![SliderKind::CoverPosition],
            WidgetType::Fan => vec![SliderKind::FanPercentage],
            _ => Vec::new(),
        }
    }

    pub fn sensor_kind(&self) -> SensorKind {
        SensorKind::from_info_type(&self.info_type)
    }
}

/// Ordered widget groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    pub groups: IndexMap<String, Vec<LayoutEntry>>,
}

impl Layout {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    /// All entries across groups, in display order.
    pub fn entries(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.groups.values().flatten()
    }

    pub fn entry(&self, entity_id: &EntityId) -> Option<&LayoutEntry> {
        self.entries().find(|e| &e.entity_id == entity_id)
    }
}

/// Read a layout file. A missing file yields an empty layout.
pub fn load_layout(path: &Path) -> Result<Layout, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "layout file not found, panel will be empty");
            return Ok(Layout::default());
        }
        Err(e) => return Err(e.into()),
    };

    let layout = Layout::parse(&raw).map_err(|source| ConfigError::Layout {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(groups = layout.groups.len(), "layout loaded");
    Ok(layout)
}
