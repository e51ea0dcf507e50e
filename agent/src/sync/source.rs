//! Data sources polled by coordinators

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::WattrixError;
use crate::http::device::DeviceApi;
use crate::models::status::StatusSnapshot;

/// Something a coordinator can fetch a snapshot from
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(&self) -> Result<StatusSnapshot, WattrixError>;
}

/// Which device read a coordinator polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Status,
    SerialNumber,
    Version,
    DeviceInfo,
}

impl ReadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadKind::Status => "status",
            ReadKind::SerialNumber => "serial_number",
            ReadKind::Version => "version",
            ReadKind::DeviceInfo => "device_info",
        }
    }
}

/// One of the device's read endpoints
pub struct DeviceRead {
    device: Arc<dyn DeviceApi>,
    kind: ReadKind,
}

impl DeviceRead {
    pub fn new(device: Arc<dyn DeviceApi>, kind: ReadKind) -> Self {
        Self { device, kind }
    }
}

#[async_trait]
impl UpdateSource for DeviceRead {
    async fn fetch(&self) -> Result<StatusSnapshot, WattrixError> {
        debug!("Reading device {}", self.kind.as_str());
        match self.kind {
            ReadKind::Status => self.device.get_status().await,
            ReadKind::SerialNumber => self.device.get_serial_number().await,
            ReadKind::Version => self.device.get_version().await,
            ReadKind::DeviceInfo => self.device.get_device_info().await,
        }
    }
}
