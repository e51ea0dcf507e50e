//! Read-only sensors bound to coordinator fields

use std::sync::Arc;

use serde_json::Value;

use crate::entities::{unique_id, Entity, EntityKind};
use crate::models::status::keys;
use crate::sync::coordinator::Coordinator;

/// Static description of a status sensor
#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    /// Entity id component; distinct from the selector's `mode`
    pub id: &'static str,
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
}

pub const STATUS_SENSORS: [SensorDescription; 7] = [
    SensorDescription {
        id: "mode_status",
        key: keys::MODE,
        name: "Wattrix Mode",
        unit: None,
    },
    SensorDescription {
        id: keys::CURRENT_POWER,
        key: keys::CURRENT_POWER,
        name: "Wattrix Current Power",
        unit: Some("W"),
    },
    SensorDescription {
        id: keys::TARGET_POWER,
        key: keys::TARGET_POWER,
        name: "Wattrix Target Power",
        unit: Some("W"),
    },
    SensorDescription {
        id: keys::POWER_LIMIT_PERCENTAGE,
        key: keys::POWER_LIMIT_PERCENTAGE,
        name: "Wattrix Power Limit",
        unit: Some("%"),
    },
    SensorDescription {
        id: keys::TIMEOUT_SECONDS,
        key: keys::TIMEOUT_SECONDS,
        name: "Wattrix Timeout",
        unit: Some("s"),
    },
    SensorDescription {
        id: keys::SETPOINT,
        key: keys::SETPOINT,
        name: "Wattrix Setpoint",
        unit: Some("W"),
    },
    SensorDescription {
        id: keys::TEMPERATURE,
        key: keys::TEMPERATURE,
        name: "Wattrix Temperature",
        unit: Some("°C"),
    },
];

/// Gauge showing one field of a coordinator's snapshot
pub struct Sensor {
    coordinator: Arc<Coordinator>,
    description: SensorDescription,
    unique_id: String,
}

impl Sensor {
    pub fn new(coordinator: Arc<Coordinator>, description: SensorDescription, serial_number: &str) -> Self {
        Self {
            coordinator,
            description,
            unique_id: unique_id(description.id, serial_number),
        }
    }
}

impl Entity for Sensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        self.description.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Sensor
    }

    fn value(&self) -> Option<Value> {
        self.coordinator.get(self.description.key)
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    fn unit(&self) -> Option<&'static str> {
        self.description.unit
    }
}

/// Whether the last status poll succeeded
pub struct OnlineSensor {
    coordinator: Arc<Coordinator>,
    unique_id: String,
}

impl OnlineSensor {
    pub fn new(coordinator: Arc<Coordinator>, serial_number: &str) -> Self {
        Self {
            coordinator,
            unique_id: unique_id("online", serial_number),
        }
    }
}

impl Entity for OnlineSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        "Wattrix Online Status"
    }

    fn kind(&self) -> EntityKind {
        EntityKind::BinarySensor
    }

    fn value(&self) -> Option<Value> {
        Some(Value::Bool(self.coordinator.last_update_success()))
    }

    fn available(&self) -> bool {
        true
    }
}

/// A field of one of the slow-changing info reads (serial number, version)
pub struct InfoSensor {
    coordinator: Arc<Coordinator>,
    key: &'static str,
    name: &'static str,
    unique_id: String,
}

impl InfoSensor {
    pub fn serial_number(coordinator: Arc<Coordinator>, serial_number: &str) -> Self {
        Self {
            coordinator,
            key: keys::SERIAL_NUMBER,
            name: "Wattrix Serial Number",
            unique_id: unique_id("serial", serial_number),
        }
    }

    pub fn version(coordinator: Arc<Coordinator>, serial_number: &str) -> Self {
        Self {
            coordinator,
            key: keys::VERSION,
            name: "Wattrix Firmware Version",
            unique_id: unique_id("version", serial_number),
        }
    }
}

impl Entity for InfoSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Sensor
    }

    fn value(&self) -> Option<Value> {
        self.coordinator.get(self.key)
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }
}
