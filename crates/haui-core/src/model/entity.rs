// ── Entity state ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Last known state of one entity, exactly as the hub reported it.
///
/// Timestamps are kept as the hub's strings; anything beyond the core
/// fields (`context`, ...) is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Id carried inside the hub's state object. The cache key is the
    /// authoritative id, so this is read but never written back out.
    #[serde(default, skip_serializing)]
    pub entity_id: Option<String>,

    /// Primary value: `"on"`, `"off"`, `"21.5"`, `"unavailable"`, ...
    pub state: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityState {
    /// Minimal state with no attributes.
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            entity_id: None,
            state: state.into(),
            attributes: Map::new(),
            last_changed: None,
            last_updated: None,
            extra: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Numeric attribute, accepting both JSON numbers and numeric strings.
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attribute_str("friendly_name")
    }

    pub fn unit(&self) -> Option<&str> {
        self.attribute_str("unit_of_measurement")
    }

    pub fn device_class(&self) -> Option<&str> {
        self.attribute_str("device_class")
    }

    pub fn is_on(&self) -> bool {
        self.state == "on"
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.state.as_str(), "unavailable" | "unknown")
    }

    /// The primary value parsed as a number.
    pub fn state_f64(&self) -> Option<f64> {
        self.state.trim().parse().ok()
    }

    /// `entity_id` field carried inside the state object, if any.
    pub fn embedded_entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_keeps_unknown_fields() {
        let raw = json!({
            "entity_id": "light.kitchen",
            "state": "on",
            "attributes": { "brightness": 180, "friendly_name": "Kitchen" },
            "last_changed": "2024-05-01T10:00:00.123456+00:00",
            "context": { "id": "01HX" }
        });
        let state: EntityState = serde_json::from_value(raw).unwrap();

        assert!(state.is_on());
        assert_eq!(state.friendly_name(), Some("Kitchen"));
        assert_eq!(state.attribute_f64("brightness"), Some(180.0));
        assert_eq!(
            state.last_changed.as_deref(),
            Some("2024-05-01T10:00:00.123456+00:00")
        );
        assert_eq!(state.embedded_entity_id(), Some("light.kitchen"));
        assert_eq!(state.extra["context"]["id"], "01HX");
        assert!(!state.extra.contains_key("entity_id"));
    }

    #[test]
    fn serialized_state_omits_the_embedded_id() {
        let raw = json!({ "entity_id": "light.a", "state": "on", "attributes": {} });
        let state: EntityState = serde_json::from_value(raw).unwrap();

        let out = serde_json::to_value(&state).unwrap();
        assert!(out.get("entity_id").is_none());
        assert_eq!(out["state"], "on");
    }

    #[test]
    fn numeric_string_attributes_parse() {
        let state = EntityState::new("3").with_attribute("step", "0.5");
        assert_eq!(state.attribute_f64("step"), Some(0.5));
        assert_eq!(state.state_f64(), Some(3.0));
    }

    #[test]
    fn missing_state_is_an_error() {
        let raw = json!({ "entity_id": "light.kitchen", "attributes": {} });
        assert!(serde_json::from_value::<EntityState>(raw).is_err());
    }
}
