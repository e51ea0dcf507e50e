//! Error types for the Wattrix agent

use thiserror::Error;

/// Main error type for the Wattrix agent
#[derive(Error, Debug)]
pub enum WattrixError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A device read failed: transport error, non-200 status or a body that
    /// is not a JSON object.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// A coordinator refresh failed; the scheduler retries on the next tick.
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// The initial refresh failed during setup; setup should be retried later.
    #[error("Device not ready: {0}")]
    NotReady(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}
