// ── Command API ──
//
// A `ServiceCall` is the raw request the hub understands. `Command` is the
// typed vocabulary of panel intents, lowered to service calls against the
// current cached state.

pub mod intent;

use haui_api::OutboundMessage;
use serde_json::{Map, Value};

use crate::model::EntityId;

pub use intent::{Command, SensorKind, SliderKind, StepDirection, number_text};

/// A remote service invocation targeting one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: EntityId,
    pub data: Map<String, Value>,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>, entity_id: EntityId) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_id,
            data: Map::new(),
        }
    }

    /// Add one field to the service data.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Build the wire message. `entity_id` is written last and wins over
    /// any same-named key in `data`.
    pub fn to_message(&self, id: u64) -> OutboundMessage {
        let mut service_data = self.data.clone();
        service_data.insert(
            "entity_id".into(),
            Value::String(self.entity_id.as_str().to_owned()),
        );
        OutboundMessage::CallService {
            id,
            domain: self.domain.clone(),
            service: self.service.clone(),
            service_data,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn message_merges_entity_id_into_data() {
        let call = ServiceCall::new("light", "turn_on", "light.kitchen".into())
            .with("brightness", 180)
            .with("entity_id", "light.other");

        let value = serde_json::to_value(call.to_message(9)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "call_service",
                "id": 9,
                "domain": "light",
                "service": "turn_on",
                "service_data": { "brightness": 180, "entity_id": "light.kitchen" }
            })
        );
    }
}
