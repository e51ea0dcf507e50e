//! Re-apply button

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::entities::select::apply_mode;
use crate::entities::{unique_id, Entity, EntityKind};
use crate::http::device::DeviceApi;
use crate::models::mode::Mode;
use crate::models::status::keys;
use crate::sync::coordinator::Coordinator;

/// Re-issues the current mode with the current pending values
pub struct ReapplyButton {
    device: Arc<dyn DeviceApi>,
    coordinator: Arc<Coordinator>,
    unique_id: String,
}

impl ReapplyButton {
    pub fn new(device: Arc<dyn DeviceApi>, coordinator: Arc<Coordinator>, serial_number: &str) -> Self {
        Self {
            device,
            coordinator,
            unique_id: unique_id("mode_reapply", serial_number),
        }
    }

    /// Returns `false` when no mode is known or the device refused it
    pub async fn press(&self) -> bool {
        let Some(current) = self.coordinator.get(keys::MODE) else {
            warn!("No mode known yet, nothing to re-apply");
            return false;
        };

        let mode: Mode = match current.as_str().map(str::parse::<Mode>) {
            Some(Ok(mode)) => mode,
            _ => {
                warn!("Device reports unknown mode {}, not re-applying", current);
                return false;
            }
        };

        let applied = apply_mode(self.device.as_ref(), &self.coordinator, mode).await;
        if !applied {
            warn!("Wattrix mode change to {} failed without exception.", mode);
        }
        applied
    }
}

impl Entity for ReapplyButton {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        "Re-apply Wattrix Mode"
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Button
    }

    fn value(&self) -> Option<Value> {
        None
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }
}
