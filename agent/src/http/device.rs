//! Wattrix device REST API

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{error, info};

use crate::errors::WattrixError;
use crate::http::client::HttpClient;
use crate::models::mode::ModeRequest;
use crate::models::status::StatusSnapshot;

pub const STATUS_PATH: &str = "/status";
pub const SERIAL_NUMBER_PATH: &str = "/serial-number";
pub const VERSION_PATH: &str = "/version";
pub const DEVICE_INFO_PATH: &str = "/device-info";
pub const MODE_PATH: &str = "/mode";

/// Device operations, as a trait for testability
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Read the current status
    async fn get_status(&self) -> Result<StatusSnapshot, WattrixError>;

    /// Read the serial number object
    async fn get_serial_number(&self) -> Result<StatusSnapshot, WattrixError>;

    /// Read the firmware version object
    async fn get_version(&self) -> Result<StatusSnapshot, WattrixError>;

    /// Read the device info object
    async fn get_device_info(&self) -> Result<StatusSnapshot, WattrixError>;

    /// Apply a mode change. `true` only when the device accepted it.
    async fn set_mode(&self, request: &ModeRequest) -> bool;
}

#[async_trait]
impl DeviceApi for HttpClient {
    async fn get_status(&self) -> Result<StatusSnapshot, WattrixError> {
        self.get_object(STATUS_PATH).await
    }

    async fn get_serial_number(&self) -> Result<StatusSnapshot, WattrixError> {
        self.get_object(SERIAL_NUMBER_PATH).await
    }

    async fn get_version(&self) -> Result<StatusSnapshot, WattrixError> {
        self.get_object(VERSION_PATH).await
    }

    async fn get_device_info(&self) -> Result<StatusSnapshot, WattrixError> {
        self.get_object(DEVICE_INFO_PATH).await
    }

    async fn set_mode(&self, request: &ModeRequest) -> bool {
        match self.post_json(MODE_PATH, request).await {
            Ok(StatusCode::OK) => {
                info!("Mode set to {} with payload {:?}", request.mode, request);
                true
            }
            Ok(status) => {
                error!("Failed to set mode {}: HTTP {}", request.mode, status);
                false
            }
            Err(e) => {
                error!("Failed to set mode {}: {}", request.mode, e);
                false
            }
        }
    }
}
