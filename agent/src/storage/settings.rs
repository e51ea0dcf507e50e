//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::WattrixError;
use crate::logs::LogLevel;

/// Default settings location
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/wattrix/settings.json";

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write daily-rolling log files into this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Device connection
    #[serde(default)]
    pub device: DeviceSettings,

    /// Status polling interval in seconds
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Serial number / version / device info polling interval in seconds
    #[serde(default = "default_polling_interval")]
    pub info_polling_interval_secs: u64,

    /// Local API server
    #[serde(default)]
    pub server: ServerSettings,

    /// Device push events
    #[serde(default)]
    pub events: EventSettings,
}

fn default_true() -> bool {
    true
}

fn default_polling_interval() -> u64 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            device: DeviceSettings::default(),
            polling_interval_secs: default_polling_interval(),
            info_polling_interval_secs: default_polling_interval(),
            server: ServerSettings::default(),
            events: EventSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, WattrixError> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Check the values that cannot be defaulted
    pub fn validate(&self) -> Result<(), WattrixError> {
        self.device.parsed_base_url()?;

        if self.polling_interval_secs == 0 || self.info_polling_interval_secs == 0 {
            return Err(WattrixError::ConfigError(
                "Polling intervals must be at least 1 second".to_string(),
            ));
        }
        if self.device.request_timeout_secs == 0 {
            return Err(WattrixError::ConfigError(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Device connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Base URL of the device REST API, e.g. `http://wattrix.local:8000`
    #[serde(default)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl DeviceSettings {
    pub fn parsed_base_url(&self) -> Result<Url, WattrixError> {
        if self.base_url.trim().is_empty() {
            return Err(WattrixError::ConfigError(
                "device.base_url is required".to_string(),
            ));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| WattrixError::ConfigError(format!("Invalid device URL {}: {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(WattrixError::ConfigError(format!(
                "Unsupported device URL scheme: {}",
                scheme
            ))),
        }
    }
}

/// Local API server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8124
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Device push event settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    #[serde(default)]
    pub enabled: bool,

    /// WebSocket port on the device host
    #[serde(default = "default_events_port")]
    pub port: u16,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

fn default_events_port() -> u16 {
    8765
}

fn default_reconnect_delay() -> u64 {
    5
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_events_port(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}
