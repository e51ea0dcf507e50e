//! Device push-event worker
//!
//! The device announces state changes on a WebSocket next to its REST API.
//! Every JSON event triggers an out-of-cycle refresh of the status
//! coordinator; bursts of events coalesce into one extra fetch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::WattrixError;
use crate::sync::coordinator::Coordinator;

/// Event worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// WebSocket port on the device host
    pub port: u16,

    /// Reconnect delay on failure
    pub reconnect_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            port: 8765,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Run the event worker
pub async fn run(
    options: &Options,
    device_base_url: String,
    coordinator: Arc<Coordinator>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Event worker starting...");

    let events_url = match build_events_url(&device_base_url, options.port) {
        Ok(url) => url,
        Err(e) => {
            error!("Failed to build events URL: {}", e);
            return;
        }
    };

    loop {
        info!("Connecting to device events: {}", events_url);

        let connection = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Event worker shutting down...");
                return;
            }
            connection = connect_async(events_url.as_str()) => connection,
        };

        match connection {
            Ok((mut ws_stream, _)) => {
                info!("Connected to device events");

                loop {
                    tokio::select! {
                        _ = &mut shutdown_signal => {
                            info!("Event worker shutting down connection...");
                            let _ = ws_stream.close(None).await;
                            return;
                        }
                        msg = ws_stream.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    handle_message(&text, &coordinator).await;
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    warn!("Device closed the event stream");
                                    break;
                                }
                                Some(Err(e)) => {
                                    error!("Device event stream error: {}", e);
                                    break;
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }
            Err(e) => {
                error!(
                    "Failed to connect to device events: {}. Retrying in {:?}...",
                    e, options.reconnect_delay
                );
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Event worker shutting down...");
                return;
            }
            _ = tokio::time::sleep(options.reconnect_delay) => {}
        }
    }
}

/// `http://host:8000` → `ws://host:{port}`
pub fn build_events_url(device_base_url: &str, port: u16) -> Result<Url, WattrixError> {
    let mut url = Url::parse(device_base_url).map_err(|e| WattrixError::ConfigError(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(WattrixError::ConfigError("Invalid device URL scheme".to_string())),
    };

    url.set_scheme(scheme)
        .map_err(|_| WattrixError::ConfigError("Failed to set scheme".to_string()))?;
    url.set_port(Some(port))
        .map_err(|_| WattrixError::ConfigError("Failed to set port".to_string()))?;
    url.set_path("/");

    Ok(url)
}

async fn handle_message(text: &str, coordinator: &Coordinator) {
    debug!("Received device event: {}", text);

    if serde_json::from_str::<serde_json::Value>(text).is_err() {
        warn!("Ignoring non-JSON device event");
        return;
    }

    if let Err(e) = coordinator.request_refresh().await {
        warn!("Refresh after device event failed: {}", e);
    }
}
