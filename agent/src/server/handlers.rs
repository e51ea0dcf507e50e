//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::state::DeviceContext;
use crate::entities::{Entity, EntityState};
use crate::errors::WattrixError;
use crate::models::pending::PendingField;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub device_online: bool,
    pub last_update_at: Option<DateTime<Utc>>,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<DeviceContext>>) -> impl IntoResponse {
    let status = &state.coordinators.status;
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "wattrix-agent".to_string(),
        version: version_info().version,
        device_online: status.last_update_success(),
        last_update_at: status.last_update_at(),
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
    pub device: Value,
    pub device_info: Value,
}

/// Version handler: agent build plus the device's version and info objects
pub async fn version_handler(State(state): State<Arc<DeviceContext>>) -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
        device: Value::Object(state.coordinators.version.data().into_map()),
        device_info: Value::Object(state.coordinators.device_info.data().into_map()),
    })
}

/// Entity list response
#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub revision: u64,
    pub last_changed: Option<DateTime<Utc>>,
    pub entities: Vec<EntityState>,
    pub total: usize,
}

/// Entity list handler
pub async fn entities_handler(State(state): State<Arc<DeviceContext>>) -> impl IntoResponse {
    let entities: Vec<EntityState> = state
        .entities
        .all()
        .into_iter()
        .map(|entity| entity.state())
        .collect();
    let total = entities.len();

    Json(EntitiesResponse {
        revision: state.revision.revision(),
        last_changed: state.revision.last_changed(),
        entities,
        total,
    })
}

/// Single entity handler
pub async fn entity_handler(
    State(state): State<Arc<DeviceContext>>,
    Path(unique_id): Path<String>,
) -> Result<Json<EntityState>, (StatusCode, Json<ActionResponse>)> {
    state
        .entities
        .find(&unique_id)
        .map(|entity| Json(entity.state()))
        .ok_or_else(|| {
            ActionResponse::from_error(&WattrixError::NotFound(format!("entity {}", unique_id)))
        })
}

/// Outcome of a user action
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                message: message.into(),
            }),
        )
    }

    fn failed(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                success: false,
                message: message.into(),
            }),
        )
    }

    fn from_error(e: &WattrixError) -> (StatusCode, Json<Self>) {
        let status = match e {
            WattrixError::ValidationError(_) => StatusCode::BAD_REQUEST,
            WattrixError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::failed(status, e.to_string())
    }
}

/// Mode selection request
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub option: String,
}

/// Mode selector handler
pub async fn select_mode_handler(
    State(state): State<Arc<DeviceContext>>,
    Json(request): Json<SelectRequest>,
) -> impl IntoResponse {
    match state.entities.mode.select_option(&request.option).await {
        Ok(true) => ActionResponse::ok(format!("Mode changed to {}", request.option)),
        Ok(false) => ActionResponse::failed(
            StatusCode::BAD_GATEWAY,
            format!("Device refused mode {}", request.option),
        ),
        Err(e) => ActionResponse::from_error(&e),
    }
}

/// Number edit request
#[derive(Debug, Deserialize)]
pub struct NumberRequest {
    pub value: f64,
}

/// Pending number handler; `field` is `power_limit_percentage`,
/// `timeout_seconds` or `setpoint`
pub async fn number_handler(
    State(state): State<Arc<DeviceContext>>,
    Path(field): Path<PendingField>,
    Json(request): Json<NumberRequest>,
) -> impl IntoResponse {
    let number = state.entities.number(field);
    match number.set_value(request.value) {
        Ok(()) => ActionResponse::ok(format!("{} set to {}", number.name(), request.value)),
        Err(e) => ActionResponse::from_error(&e),
    }
}

/// Re-apply button handler
pub async fn reapply_handler(State(state): State<Arc<DeviceContext>>) -> impl IntoResponse {
    if state.entities.reapply.press().await {
        ActionResponse::ok("Mode re-applied")
    } else {
        ActionResponse::failed(StatusCode::BAD_GATEWAY, "Mode could not be re-applied")
    }
}
