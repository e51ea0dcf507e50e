//! Device status snapshot

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known keys reported by the device
pub mod keys {
    pub const MODE: &str = "mode";
    pub const CURRENT_POWER: &str = "current_power";
    pub const TARGET_POWER: &str = "target_power";
    pub const POWER_LIMIT_PERCENTAGE: &str = "power_limit_percentage";
    pub const TIMEOUT_SECONDS: &str = "timeout_seconds";
    pub const SETPOINT: &str = "setpoint";
    pub const TEMPERATURE: &str = "temperature";
    pub const SERIAL_NUMBER: &str = "serial_number";
    pub const VERSION: &str = "version";

    /// Suffix of user-edited values that are never taken from device reads
    pub const PENDING_SUFFIX: &str = "_to_set";
}

/// Last known device state: a schema-less map of field name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusSnapshot {
    fields: Map<String, Value>,
}

impl StatusSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        let value = self.fields.get(key)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Field-wise merge: keys in `other` overwrite, keys only in `self` are
    /// retained. Pending (`*_to_set`) keys in `other` are skipped. Returns the
    /// number of fields taken from `other`.
    pub fn merge(&mut self, other: StatusSnapshot) -> usize {
        let mut merged = 0;
        for (key, value) in other.fields {
            if key.ends_with(keys::PENDING_SUFFIX) {
                continue;
            }
            self.fields.insert(key, value);
            merged += 1;
        }
        merged
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for StatusSnapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl TryFrom<Value> for StatusSnapshot {
    type Error = Value;

    /// Only JSON objects are snapshots; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(other),
        }
    }
}
