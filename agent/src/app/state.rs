//! Per-device context

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::entities::button::ReapplyButton;
use crate::entities::number::{self, PendingNumber};
use crate::entities::select::ModeSelect;
use crate::entities::sensor::{InfoSensor, OnlineSensor, Sensor, STATUS_SENSORS};
use crate::entities::{Entity, UNKNOWN_SERIAL};
use crate::errors::WattrixError;
use crate::http::device::DeviceApi;
use crate::models::pending::PendingField;
use crate::models::status::keys;
use crate::sync::coordinator::Coordinator;
use crate::sync::listeners::Subscription;
use crate::sync::source::{DeviceRead, ReadKind};

/// Counts coordinator updates so clients can tell when entity states changed
pub struct RevisionTracker {
    revision: AtomicU64,
    last_changed: RwLock<Option<DateTime<Utc>>>,
}

impl RevisionTracker {
    pub fn new() -> Self {
        Self {
            revision: AtomicU64::new(0),
            last_changed: RwLock::new(None),
        }
    }

    pub fn bump(&self, at: DateTime<Utc>) {
        self.revision.fetch_add(1, Ordering::SeqCst);
        let mut last_changed = self.last_changed.write().unwrap_or_else(|e| e.into_inner());
        *last_changed = Some(at);
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn last_changed(&self) -> Option<DateTime<Utc>> {
        *self.last_changed.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RevisionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// The coordinators of one device
#[derive(Clone)]
pub struct Coordinators {
    pub status: Arc<Coordinator>,
    pub serial_number: Arc<Coordinator>,
    pub version: Arc<Coordinator>,
    pub device_info: Arc<Coordinator>,
}

impl Coordinators {
    pub fn new(device: Arc<dyn DeviceApi>, options: &AppOptions) -> Self {
        let coordinator = |options, kind| {
            Arc::new(Coordinator::new(
                options,
                Arc::new(DeviceRead::new(device.clone(), kind)),
            ))
        };

        Self {
            status: coordinator(options.status.clone(), ReadKind::Status),
            serial_number: coordinator(
                options.info_coordinator("Wattrix Serial Number Coordinator"),
                ReadKind::SerialNumber,
            ),
            version: coordinator(
                options.info_coordinator("Wattrix Version Coordinator"),
                ReadKind::Version,
            ),
            device_info: coordinator(
                options.info_coordinator("Wattrix Device State Coordinator"),
                ReadKind::DeviceInfo,
            ),
        }
    }

    pub fn all(&self) -> [&Arc<Coordinator>; 4] {
        [&self.status, &self.serial_number, &self.version, &self.device_info]
    }
}

/// Every entity of one device
pub struct Entities {
    pub sensors: Vec<Sensor>,
    pub online: OnlineSensor,
    pub serial_number: InfoSensor,
    pub version: InfoSensor,
    pub percentage: PendingNumber,
    pub timeout: PendingNumber,
    pub setpoint: PendingNumber,
    pub mode: ModeSelect,
    pub reapply: ReapplyButton,
}

impl Entities {
    pub fn new(device: Arc<dyn DeviceApi>, coordinators: &Coordinators, serial_number: &str) -> Self {
        let status = &coordinators.status;
        Self {
            sensors: STATUS_SENSORS
                .iter()
                .map(|description| Sensor::new(status.clone(), *description, serial_number))
                .collect(),
            online: OnlineSensor::new(status.clone(), serial_number),
            serial_number: InfoSensor::serial_number(coordinators.serial_number.clone(), serial_number),
            version: InfoSensor::version(coordinators.version.clone(), serial_number),
            percentage: PendingNumber::new(status.clone(), number::PERCENTAGE, serial_number),
            timeout: PendingNumber::new(status.clone(), number::TIMEOUT, serial_number),
            setpoint: PendingNumber::new(status.clone(), number::SETPOINT, serial_number),
            mode: ModeSelect::new(device.clone(), status.clone(), serial_number),
            reapply: ReapplyButton::new(device, status.clone(), serial_number),
        }
    }

    pub fn all(&self) -> Vec<&dyn Entity> {
        let mut all: Vec<&dyn Entity> = self.sensors.iter().map(|s| s as &dyn Entity).collect();
        all.push(&self.online);
        all.push(&self.serial_number);
        all.push(&self.version);
        all.push(&self.percentage);
        all.push(&self.timeout);
        all.push(&self.setpoint);
        all.push(&self.mode);
        all.push(&self.reapply);
        all
    }

    pub fn find(&self, unique_id: &str) -> Option<&dyn Entity> {
        self.all().into_iter().find(|e| e.unique_id() == unique_id)
    }

    pub fn number(&self, field: PendingField) -> &PendingNumber {
        match field {
            PendingField::PowerLimitPercentage => &self.percentage,
            PendingField::TimeoutSeconds => &self.timeout,
            PendingField::Setpoint => &self.setpoint,
        }
    }
}

/// Everything the integration holds for one configured device
pub struct DeviceContext {
    pub device: Arc<dyn DeviceApi>,
    pub base_url: String,
    pub coordinators: Coordinators,
    pub entities: Entities,
    pub revision: Arc<RevisionTracker>,
    _subscriptions: Vec<Subscription>,
}

impl DeviceContext {
    /// Build the context and run the first refreshes.
    ///
    /// Fails with [`WattrixError::NotReady`] when the first status read fails;
    /// the info reads only warn.
    pub async fn init(
        device: Arc<dyn DeviceApi>,
        base_url: &str,
        options: &AppOptions,
    ) -> Result<Self, WattrixError> {
        info!("Initializing device context for {}...", base_url);

        let coordinators = Coordinators::new(device.clone(), options);
        coordinators.status.first_refresh().await?;

        for coordinator in [
            &coordinators.serial_number,
            &coordinators.version,
            &coordinators.device_info,
        ] {
            if let Err(e) = coordinator.first_refresh().await {
                warn!("{}", e);
            }
        }

        let serial_number = coordinators
            .serial_number
            .get(keys::SERIAL_NUMBER)
            .and_then(|value| match value {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| {
                warn!("Serial number unavailable, using '{}' in entity ids", UNKNOWN_SERIAL);
                UNKNOWN_SERIAL.to_string()
            });

        let entities = Entities::new(device.clone(), &coordinators, &serial_number);

        let revision = Arc::new(RevisionTracker::new());
        let subscriptions = coordinators
            .all()
            .into_iter()
            .map(|coordinator| {
                let revision = revision.clone();
                coordinator.subscribe(move |event| revision.bump(event.at))
            })
            .collect();

        info!(
            "Device {} ready: {} entities",
            serial_number,
            entities.all().len()
        );

        Ok(Self {
            device,
            base_url: base_url.to_string(),
            coordinators,
            entities,
            revision,
            _subscriptions: subscriptions,
        })
    }
}
