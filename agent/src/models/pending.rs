//! User-edited values waiting for the next mode change

use serde::{Deserialize, Serialize};

use crate::models::mode::{Mode, ModeRequest};
use crate::models::status::{keys, StatusSnapshot};

pub const DEFAULT_POWER_LIMIT_PERCENTAGE: f64 = 100.0;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 900;
pub const DEFAULT_SETPOINT: f64 = 200.0;

/// Which pending value an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingField {
    PowerLimitPercentage,
    TimeoutSeconds,
    Setpoint,
}

impl PendingField {
    /// Key under which the value is exposed, e.g. `setpoint_to_set`
    pub fn key(&self) -> &'static str {
        match self {
            PendingField::PowerLimitPercentage => "power_limit_percentage_to_set",
            PendingField::TimeoutSeconds => "timeout_seconds_to_set",
            PendingField::Setpoint => "setpoint_to_set",
        }
    }
}

/// Pending write values held next to the last-read snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingWrites {
    pub power_limit_percentage: f64,
    pub timeout_seconds: u64,
    pub setpoint: f64,
}

impl Default for PendingWrites {
    fn default() -> Self {
        Self {
            power_limit_percentage: DEFAULT_POWER_LIMIT_PERCENTAGE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            setpoint: DEFAULT_SETPOINT,
        }
    }
}

impl PendingWrites {
    /// Seed from the applied values of a device read, defaults where absent
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        let mut pending = Self::default();
        pending.adopt_applied(snapshot);
        pending
    }

    /// Take over whichever applied values the read reports
    pub fn adopt_applied(&mut self, snapshot: &StatusSnapshot) {
        if let Some(percentage) = snapshot.get_f64(keys::POWER_LIMIT_PERCENTAGE) {
            self.power_limit_percentage = percentage;
        }
        if let Some(timeout) = snapshot.get_u64(keys::TIMEOUT_SECONDS) {
            self.timeout_seconds = timeout;
        }
        if let Some(setpoint) = snapshot.get_f64(keys::SETPOINT) {
            self.setpoint = setpoint;
        }
    }

    pub fn get(&self, field: PendingField) -> f64 {
        match field {
            PendingField::PowerLimitPercentage => self.power_limit_percentage,
            PendingField::TimeoutSeconds => self.timeout_seconds as f64,
            PendingField::Setpoint => self.setpoint,
        }
    }

    pub fn set(&mut self, field: PendingField, value: f64) {
        match field {
            PendingField::PowerLimitPercentage => self.power_limit_percentage = value,
            PendingField::TimeoutSeconds => self.timeout_seconds = value.max(0.0).round() as u64,
            PendingField::Setpoint => self.setpoint = value,
        }
    }

    /// Build the mode change carrying these values
    pub fn to_request(&self, mode: Mode) -> ModeRequest {
        ModeRequest::new(mode, self.power_limit_percentage, self.timeout_seconds)
            .with_setpoint(self.setpoint)
    }
}
