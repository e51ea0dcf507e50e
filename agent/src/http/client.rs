//! HTTP client implementation

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::WattrixError;
use crate::models::status::StatusSnapshot;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to one device's base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WattrixError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing transport
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a path that answers with a JSON object.
    ///
    /// Only HTTP 200 counts as success. Every failure is reported as
    /// [`WattrixError::FetchError`].
    pub async fn get_object(&self, path: &str) -> Result<StatusSnapshot, WattrixError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WattrixError::FetchError(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET {} failed: {} - {}", path, status, body);
            return Err(WattrixError::FetchError(format!("HTTP {} from {}", status, path)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| WattrixError::FetchError(format!("Invalid JSON from {}: {}", path, e)))?;

        StatusSnapshot::try_from(body).map_err(|other| {
            WattrixError::FetchError(format!(
                "Expected a JSON object from {}, got {}",
                path,
                json_kind(&other)
            ))
        })
    }

    /// POST a JSON body and return the response status
    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<StatusCode, WattrixError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP POST {} failed: {} - {}", path, status, body);
        }

        Ok(status)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
