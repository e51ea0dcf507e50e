//! Mode selector

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::entities::{unique_id, Entity, EntityKind};
use crate::errors::WattrixError;
use crate::http::device::DeviceApi;
use crate::models::mode::Mode;
use crate::models::pending::DEFAULT_POWER_LIMIT_PERCENTAGE;
use crate::models::status::keys;
use crate::sync::coordinator::Coordinator;

/// Send `mode` with the coordinator's pending values.
///
/// On success the new mode is written into the snapshot and an out-of-cycle
/// refresh is requested. A failed write leaves the snapshot untouched.
pub async fn apply_mode(device: &dyn DeviceApi, coordinator: &Coordinator, mode: Mode) -> bool {
    let request = coordinator.pending().to_request(mode);
    info!(
        "Calling Wattrix API with: mode={}, power_limit_percentage={}, timeout_seconds={}, setpoint={:?}",
        request.mode, request.power_limit_percentage, request.timeout_seconds, request.setpoint
    );

    if !device.set_mode(&request).await {
        error!("Failed to set mode to {}", mode);
        return false;
    }

    info!("Mode changed to {}", mode);
    coordinator.set_value(keys::MODE, Value::from(mode.as_str()));
    if let Err(e) = coordinator.request_refresh().await {
        warn!("Refresh after mode change failed: {}", e);
    }
    true
}

/// Enumerated selector for the heating mode
pub struct ModeSelect {
    device: Arc<dyn DeviceApi>,
    coordinator: Arc<Coordinator>,
    serial_number: String,
    unique_id: String,
}

impl ModeSelect {
    pub fn new(device: Arc<dyn DeviceApi>, coordinator: Arc<Coordinator>, serial_number: &str) -> Self {
        Self {
            device,
            coordinator,
            serial_number: serial_number.to_string(),
            unique_id: unique_id(keys::MODE, serial_number),
        }
    }

    pub fn options(&self) -> Vec<&'static str> {
        Mode::ALL.iter().map(Mode::as_str).collect()
    }

    /// Mode currently reported by the device
    pub fn current_option(&self) -> Option<Mode> {
        self.coordinator
            .get(keys::MODE)
            .and_then(|value| value.as_str().and_then(|s| s.parse().ok()))
    }

    /// Apply a mode by wire name. `Ok(false)` when the device refused it.
    pub async fn select_option(&self, option: &str) -> Result<bool, WattrixError> {
        let mode: Mode = option.parse().map_err(|e: String| {
            error!("Invalid option selected: {}", option);
            WattrixError::ValidationError(e)
        })?;

        Ok(apply_mode(self.device.as_ref(), &self.coordinator, mode).await)
    }
}

impl Entity for ModeSelect {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        "Wattrix Mode Selector"
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Select
    }

    fn value(&self) -> Option<Value> {
        self.coordinator.get(keys::MODE)
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    fn attributes(&self) -> Map<String, Value> {
        let data = self.coordinator.data();
        let mut attributes = Map::new();
        attributes.insert(
            keys::POWER_LIMIT_PERCENTAGE.to_string(),
            data.get(keys::POWER_LIMIT_PERCENTAGE)
                .cloned()
                .unwrap_or(Value::from(DEFAULT_POWER_LIMIT_PERCENTAGE)),
        );
        attributes.insert(
            keys::TIMEOUT_SECONDS.to_string(),
            data.get(keys::TIMEOUT_SECONDS).cloned().unwrap_or(Value::Null),
        );
        attributes.insert(
            keys::SETPOINT.to_string(),
            data.get(keys::SETPOINT).cloned().unwrap_or(Value::Null),
        );
        attributes.insert(
            keys::SERIAL_NUMBER.to_string(),
            Value::from(self.serial_number.as_str()),
        );
        attributes.insert(
            "options".to_string(),
            Value::from(self.options()),
        );
        attributes.insert(
            "option_labels".to_string(),
            Mode::ALL
                .iter()
                .map(|mode| (mode.as_str().to_string(), Value::from(mode.label())))
                .collect::<Map<String, Value>>()
                .into(),
        );
        attributes
    }
}
