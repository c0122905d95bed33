//! Wire types for the hub's WebSocket message protocol.
//!
//! Every frame is a JSON object with a `type` discriminator. Outbound
//! requests (other than `auth`) carry a unique integer `id`; the hub echoes
//! it on the matching `result` and on events delivered for a subscription.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event type the panel subscribes to.
pub const STATE_CHANGED: &str = "state_changed";

// ── Outbound ─────────────────────────────────────────────────────────

/// A message sent from the panel to the hub.
#[derive(Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// First frame after the socket opens.
    Auth { access_token: String },

    /// Subscribe to the hub's event bus, filtered by event type.
    SubscribeEvents { id: u64, event_type: String },

    /// Request a full snapshot of every entity state.
    GetStates { id: u64 },

    /// Invoke a service on the hub.
    CallService {
        id: u64,
        domain: String,
        service: String,
        service_data: Map<String, Value>,
    },
}

impl OutboundMessage {
    /// Request id, if this message carries one (`auth` does not).
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Auth { .. } => None,
            Self::SubscribeEvents { id, .. }
            | Self::GetStates { id }
            | Self::CallService { id, .. } => Some(*id),
        }
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::SubscribeEvents { .. } => "subscribe_events",
            Self::GetStates { .. } => "get_states",
            Self::CallService { .. } => "call_service",
        }
    }
}

// Keeps the access token out of logs.
impl fmt::Debug for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth { .. } => f
                .debug_struct("Auth")
                .field("access_token", &"[REDACTED]")
                .finish(),
            Self::SubscribeEvents { id, event_type } => f
                .debug_struct("SubscribeEvents")
                .field("id", id)
                .field("event_type", event_type)
                .finish(),
            Self::GetStates { id } => f.debug_struct("GetStates").field("id", id).finish(),
            Self::CallService {
                id,
                domain,
                service,
                service_data,
            } => f
                .debug_struct("CallService")
                .field("id", id)
                .field("domain", domain)
                .field("service", service)
                .field("service_data", service_data)
                .finish(),
        }
    }
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A message received from the hub.
///
/// Unknown `type` values deserialize to [`InboundMessage::Unknown`] so the
/// session can ignore them without treating the frame as malformed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Sent by the hub as soon as the socket opens.
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },

    /// The access token was accepted.
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },

    /// The access token was rejected; the hub closes the socket next.
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },

    /// An event pushed for an active subscription.
    Event {
        #[serde(default)]
        id: Option<u64>,
        event: EventPayload,
    },

    /// Response to a request.
    Result {
        #[serde(default)]
        id: Option<u64>,
        #[serde(default)]
        success: bool,
        #[serde(default)]
        error: Option<ResultError>,
        #[serde(default)]
        result: Option<Value>,
    },

    #[serde(other)]
    Unknown,
}

/// The `event` object of an `event` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub event_type: Option<String>,
    pub data: StateChangedData,
    #[serde(default)]
    pub time_fired: Option<String>,
}

/// Payload of a `state_changed` event.
///
/// `new_state` is `None` when the entity was removed from the hub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateChangedData {
    pub entity_id: String,
    #[serde(default)]
    pub new_state: Option<Value>,
    #[serde(default)]
    pub old_state: Option<Value>,
}

/// The `error` object of a failed `result`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Display for ResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{code}: {message}"),
            (None, Some(message)) => f.write_str(message),
            (Some(code), None) => f.write_str(code),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

/// Parse a text frame into an [`InboundMessage`].
pub fn parse_inbound(text: &str) -> Result<InboundMessage, serde_json::Error> {
    serde_json::from_str(text)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn auth_serializes_with_type_tag() {
        let msg = OutboundMessage::Auth {
            access_token: "secret".into(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({ "type": "auth", "access_token": "secret" }));
        assert_eq!(msg.id(), None);
    }

    #[test]
    fn auth_debug_redacts_token() {
        let msg = OutboundMessage::Auth {
            access_token: "secret".into(),
        };
        let debug = format!("{msg:?}");
        assert!(!debug.contains("secret"), "token leaked: {debug}");
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn call_service_serializes_service_data() {
        let mut data = Map::new();
        data.insert("brightness".into(), json!(180));
        data.insert("entity_id".into(), json!("light.kitchen"));

        let msg = OutboundMessage::CallService {
            id: 7,
            domain: "light".into(),
            service: "turn_on".into(),
            service_data: data,
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "call_service",
                "id": 7,
                "domain": "light",
                "service": "turn_on",
                "service_data": { "brightness": 180, "entity_id": "light.kitchen" }
            })
        );
        assert_eq!(msg.id(), Some(7));
    }

    #[test]
    fn subscribe_events_wire_shape() {
        let msg = OutboundMessage::SubscribeEvents {
            id: 2,
            event_type: STATE_CHANGED.into(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({ "type": "subscribe_events", "id": 2, "event_type": "state_changed" })
        );
    }

    #[test]
    fn parse_auth_ok() {
        let msg = parse_inbound(r#"{"type":"auth_ok","ha_version":"2024.6.0"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::AuthOk {
                ha_version: Some("2024.6.0".into())
            }
        );
    }

    #[test]
    fn parse_state_changed_event() {
        let raw = json!({
            "id": 2,
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": "light.x",
                    "new_state": { "state": "on", "attributes": { "brightness": 180 } }
                }
            }
        });

        let msg = parse_inbound(&raw.to_string()).unwrap();
        let InboundMessage::Event { id, event } = msg else {
            panic!("expected event");
        };
        assert_eq!(id, Some(2));
        assert_eq!(event.data.entity_id, "light.x");
        assert_eq!(
            event.data.new_state,
            Some(json!({ "state": "on", "attributes": { "brightness": 180 } }))
        );
    }

    #[test]
    fn parse_removed_entity_event_has_no_new_state() {
        let raw = json!({
            "type": "event",
            "event": { "data": { "entity_id": "light.gone", "new_state": null } }
        });
        let InboundMessage::Event { event, .. } = parse_inbound(&raw.to_string()).unwrap() else {
            panic!("expected event");
        };
        assert!(event.data.new_state.is_none());
    }

    #[test]
    fn parse_failed_result() {
        let raw = json!({
            "id": 5,
            "type": "result",
            "success": false,
            "error": { "code": "not_found", "message": "Service not found." }
        });
        let msg = parse_inbound(&raw.to_string()).unwrap();
        let InboundMessage::Result { id, success, error, result } = msg else {
            panic!("expected result");
        };
        assert_eq!(id, Some(5));
        assert!(!success);
        assert!(result.is_none());
        assert_eq!(error.unwrap().to_string(), "not_found: Service not found.");
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let msg = parse_inbound(r#"{"type":"pong","id":9}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_inbound("not json at all").is_err());
        assert!(parse_inbound(r#"{"no_type": true}"#).is_err());
    }
}
