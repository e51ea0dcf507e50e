//! Observable values exposed to users
//!
//! Every widget kind implements [`Entity`] so the local API can list them
//! uniformly. Kind-specific actions (editing a number, selecting a mode,
//! pressing a button) live on the concrete types.

use serde::Serialize;
use serde_json::{Map, Value};

pub mod button;
pub mod number;
pub mod select;
pub mod sensor;

/// Widget kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sensor,
    BinarySensor,
    Number,
    Select,
    Button,
}

/// Rendered state of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub name: String,
    pub kind: EntityKind,
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub available: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// Observable value provider
pub trait Entity: Send + Sync {
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    fn kind(&self) -> EntityKind;

    fn value(&self) -> Option<Value>;

    fn available(&self) -> bool;

    fn unit(&self) -> Option<&'static str> {
        None
    }

    fn attributes(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Snapshot for rendering; unavailable entities carry no value
    fn state(&self) -> EntityState {
        let available = self.available();
        EntityState {
            unique_id: self.unique_id().to_string(),
            name: self.name().to_string(),
            kind: self.kind(),
            value: if available { self.value() } else { None },
            unit: self.unit(),
            available,
            attributes: self.attributes(),
        }
    }
}

/// `wattrix_{key}_{serial}`
pub fn unique_id(key: &str, serial_number: &str) -> String {
    format!("wattrix_{}_{}", key, serial_number)
}

/// Placeholder when the serial number could not be read
pub const UNKNOWN_SERIAL: &str = "unknown";
