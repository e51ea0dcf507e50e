//! Editable numbers holding pending write values

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::entities::{unique_id, Entity, EntityKind};
use crate::errors::WattrixError;
use crate::models::pending::PendingField;
use crate::sync::coordinator::Coordinator;

/// Range and presentation of an editable number
#[derive(Debug, Clone, Copy)]
pub struct NumberDescription {
    pub field: PendingField,
    pub key: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: &'static str,
}

pub const PERCENTAGE: NumberDescription = NumberDescription {
    field: PendingField::PowerLimitPercentage,
    key: "mode_percentage",
    name: "Wattrix Mode Percentage",
    min: 0.0,
    max: 100.0,
    step: 1.0,
    unit: "%",
};

pub const TIMEOUT: NumberDescription = NumberDescription {
    field: PendingField::TimeoutSeconds,
    key: "mode_timeout",
    name: "Wattrix Mode Timeout",
    min: 0.0,
    max: 86_400.0,
    step: 10.0,
    unit: "s",
};

pub const SETPOINT: NumberDescription = NumberDescription {
    field: PendingField::Setpoint,
    key: "mode_setpoint",
    name: "Wattrix Regulation Setpoint",
    min: 0.0,
    max: 10_000.0,
    step: 10.0,
    unit: "W",
};

/// A pending value the user edits before applying a mode
pub struct PendingNumber {
    coordinator: Arc<Coordinator>,
    description: NumberDescription,
    unique_id: String,
}

impl PendingNumber {
    pub fn new(coordinator: Arc<Coordinator>, description: NumberDescription, serial_number: &str) -> Self {
        Self {
            coordinator,
            description,
            unique_id: unique_id(description.key, serial_number),
        }
    }

    pub fn field(&self) -> PendingField {
        self.description.field
    }

    pub fn native_value(&self) -> f64 {
        self.coordinator.pending().get(self.description.field)
    }

    /// Store a new pending value; it is sent with the next mode change
    pub fn set_value(&self, value: f64) -> Result<(), WattrixError> {
        let NumberDescription { min, max, name, .. } = self.description;
        if !value.is_finite() || value < min || value > max {
            return Err(WattrixError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }

        self.coordinator.set_pending(self.description.field, value);
        info!("{} set to {}", name, value);
        Ok(())
    }
}

impl Entity for PendingNumber {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        self.description.name
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Number
    }

    fn value(&self) -> Option<Value> {
        let value = self.native_value();
        match self.description.field {
            PendingField::TimeoutSeconds => Some(Value::from(value as u64)),
            _ => Some(Value::from(value)),
        }
    }

    fn available(&self) -> bool {
        true
    }

    fn unit(&self) -> Option<&'static str> {
        Some(self.description.unit)
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("min".to_string(), Value::from(self.description.min));
        attributes.insert("max".to_string(), Value::from(self.description.max));
        attributes.insert("step".to_string(), Value::from(self.description.step));
        attributes
    }
}
