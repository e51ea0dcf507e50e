//! Connection check run before a device is configured

use std::time::Duration;

use tracing::{error, info};

use crate::errors::WattrixError;
use crate::http::client::HttpClient;
use crate::http::device::DeviceApi;
use crate::models::status::StatusSnapshot;

/// Error key reported when the device does not answer
pub const CANNOT_CONNECT: &str = "cannot_connect";

/// Probe `GET /version`; only HTTP 200 with a JSON object is a success.
pub async fn validate_device(device: &dyn DeviceApi) -> Result<StatusSnapshot, WattrixError> {
    match device.get_version().await {
        Ok(version) => {
            info!("Wattrix device answered: {:?}", version);
            Ok(version)
        }
        Err(e) => {
            error!("Error connecting to Wattrix API: {}", e);
            Err(WattrixError::ConfigError(format!("{} ({})", CANNOT_CONNECT, e)))
        }
    }
}

/// Validate a base URL before it is stored
pub async fn validate_connection(base_url: &str, timeout: Duration) -> Result<StatusSnapshot, WattrixError> {
    let client = HttpClient::new(base_url, timeout)?;
    validate_device(&client).await
}
