// ── Entity identity ──
//
// Every hub entity is addressed by `<domain>.<object_id>`. The domain
// prefix decides which services and widgets apply to it.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

// ── Domain ──────────────────────────────────────────────────────────

/// The domain prefix of an entity identifier.
///
/// Hubs grow new domains over time, so anything unrecognized lands in
/// [`Domain::Other`] instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Domain {
    Light,
    Switch,
    Cover,
    Fan,
    Number,
    Sensor,
    BinarySensor,
    Select,
    Other(String),
}

impl Domain {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Light => "light",
            Self::Switch => "switch",
            Self::Cover => "cover",
            Self::Fan => "fan",
            Self::Number => "number",
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Select => "select",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        match s {
            "light" => Self::Light,
            "switch" => Self::Switch,
            "cover" => Self::Cover,
            "fan" => Self::Fan,
            "number" => Self::Number,
            "sensor" => Self::Sensor,
            "binary_sensor" => Self::BinarySensor,
            "select" => Self::Select,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── EntityId ────────────────────────────────────────────────────────

/// Identifier of a hub entity, e.g. `light.kitchen`.
///
/// Conversions from `String`/`&str` are infallible and keep the value
/// verbatim (the hub is the authority on what exists). Use [`FromStr`]
/// for user input, which insists on a `domain.object_id` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed domain prefix. An identifier without a `.` is all domain.
    pub fn domain(&self) -> Domain {
        Domain::from(self.domain_str())
    }

    /// Raw domain prefix.
    pub fn domain_str(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(d, _)| d)
    }

    /// Everything after the first `.`.
    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, o)| o)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejected user-supplied entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id {0:?}: expected <domain>.<object_id>")]
pub struct InvalidEntityId(pub String);

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('.') {
            Some((domain, object)) if !domain.is_empty() && !object.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(InvalidEntityId(s.to_owned())),
        }
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
