//! Application configuration options

use std::time::Duration;

use crate::storage::settings::Settings;
use crate::sync::coordinator;
use crate::utils::CooldownOptions;
use crate::workers::events;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Device REST API base URL
    pub device_base_url: String,

    /// Per-request timeout of the device client
    pub request_timeout: Duration,

    /// Status coordinator options
    pub status: coordinator::Options,

    /// Interval for the serial number, version and device info coordinators
    pub info_interval: Duration,

    /// Enable local HTTP server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Enable device push events
    pub enable_events: bool,

    /// Event worker options
    pub events: events::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            device_base_url: "http://wattrix.local:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            status: coordinator::Options::default(),
            info_interval: Duration::from_secs(15),
            enable_server: true,
            server: ServerOptions::default(),
            enable_events: false,
            events: events::Options::default(),
        }
    }
}

impl AppOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let request_timeout = Duration::from_secs(settings.device.request_timeout_secs);
        Self {
            device_base_url: settings.device.base_url.clone(),
            request_timeout,
            status: coordinator::Options {
                interval: Duration::from_secs(settings.polling_interval_secs),
                timeout: request_timeout,
                ..Default::default()
            },
            info_interval: Duration::from_secs(settings.info_polling_interval_secs),
            enable_server: settings.server.enabled,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            enable_events: settings.events.enabled,
            events: events::Options {
                port: settings.events.port,
                reconnect_delay: Duration::from_secs(settings.events.reconnect_delay_secs),
            },
            ..Default::default()
        }
    }

    /// Options for one of the slow-changing info coordinators
    pub fn info_coordinator(&self, name: &str) -> coordinator::Options {
        coordinator::Options {
            name: name.to_string(),
            interval: self.info_interval,
            timeout: self.status.timeout,
            track_pending_writes: false,
        }
    }
}

/// Lifecycle options for the agent
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,

    /// Backoff between setup attempts while the device is not ready
    pub setup_retry: CooldownOptions,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
            setup_retry: CooldownOptions::default(),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8124,
        }
    }
}
