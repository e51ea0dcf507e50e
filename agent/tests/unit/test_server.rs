//! Local API router tests

mod support;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use support::ScriptedDevice;
use wattrix::app::options::AppOptions;
use wattrix::app::state::DeviceContext;
use wattrix::entities::Entity;
use wattrix::http::device::DeviceApi;
use wattrix::server::serve::router;

async fn context(device: &Arc<ScriptedDevice>) -> Arc<DeviceContext> {
    device.push_status(json!({
        "mode": "DISABLED",
        "current_power": 0,
        "power_limit_percentage": 100,
        "timeout_seconds": 900,
    }));
    let api: Arc<dyn DeviceApi> = device.clone();
    Arc::new(
        DeviceContext::init(api, "http://wattrix.test:8000", &AppOptions::default())
            .await
            .unwrap(),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let device = ScriptedDevice::new();
    let app = router(context(&device).await);

    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["device_online"], json!(true));
}

#[tokio::test]
async fn test_version_includes_device_version() {
    let device = ScriptedDevice::new();
    let app = router(context(&device).await);

    let (status, body) = send(app, get("/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device"]["version"], json!("1.4.2"));
    assert_eq!(body["device_info"]["model"], json!("Wattrix One"));
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_list_entities() {
    let device = ScriptedDevice::new();
    let app = router(context(&device).await);

    let (status, body) = send(app, get("/entities")).await;
    assert_eq!(status, StatusCode::OK);

    let entities = body["entities"].as_array().unwrap();
    assert_eq!(body["total"], json!(entities.len()));
    assert!(entities
        .iter()
        .any(|e| e["unique_id"] == json!("wattrix_mode_WX-0042") && e["kind"] == json!("select")));
    assert!(entities
        .iter()
        .any(|e| e["unique_id"] == json!("wattrix_mode_setpoint_WX-0042") && e["value"] == json!(200.0)));
}

#[tokio::test]
async fn test_get_entity_and_missing_entity() {
    let device = ScriptedDevice::new();
    let context = context(&device).await;

    let (status, body) = send(router(context.clone()), get("/entities/wattrix_current_power_WX-0042")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!(0));
    assert_eq!(body["unit"], json!("W"));

    let (status, body) = send(router(context), get("/entities/wattrix_nothing_WX-0042")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("wattrix_nothing_WX-0042"));
}

#[tokio::test]
async fn test_entity_ids_are_distinct() {
    let device = ScriptedDevice::new();
    let context = context(&device).await;

    let entities = context.entities.all();
    let ids: Vec<&str> = entities.into_iter().map(|e| e.unique_id()).collect();
    let distinct: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(distinct.len(), ids.len(), "duplicate entity ids in {:?}", ids);
}

#[tokio::test]
async fn test_mode_selector_and_sensor_lookup() {
    let device = ScriptedDevice::new();
    let context = context(&device).await;

    let (status, body) = send(router(context.clone()), get("/entities/wattrix_mode_WX-0042")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], json!("select"));

    let (status, body) = send(router(context), get("/entities/wattrix_mode_status_WX-0042")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], json!("sensor"));
    assert_eq!(body["value"], json!("DISABLED"));
}

#[tokio::test]
async fn test_select_mode() {
    let device = ScriptedDevice::new();
    let context = context(&device).await;
    device.push_status(json!({"mode": "EXPORT_SURPLUS_HEATING"}));

    let (status, body) = send(
        router(context.clone()),
        post("/select/mode", json!({"option": "EXPORT_SURPLUS_HEATING"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        context.coordinators.status.get("mode"),
        Some(json!("EXPORT_SURPLUS_HEATING"))
    );
    assert_eq!(device.requests().len(), 1);
}

#[tokio::test]
async fn test_select_mode_invalid_option() {
    let device = ScriptedDevice::new();
    let app = router(context(&device).await);

    let (status, body) = send(app, post("/select/mode", json!({"option": "TURBO"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(device.requests().is_empty());
}

#[tokio::test]
async fn test_select_mode_device_refuses() {
    let device = ScriptedDevice::new();
    let app = router(context(&device).await);
    device.accept_mode.store(false, Ordering::SeqCst);

    let (status, body) = send(app, post("/select/mode", json!({"option": "DISABLED"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_number_setpoint() {
    let device = ScriptedDevice::new();
    let context = context(&device).await;

    let (status, body) = send(router(context.clone()), post("/number/setpoint", json!({"value": 1500}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(context.coordinators.status.pending().setpoint, 1500.0);
}

#[tokio::test]
async fn test_number_out_of_range() {
    let device = ScriptedDevice::new();
    let context = context(&device).await;

    let (status, _) = send(
        router(context.clone()),
        post("/number/power_limit_percentage", json!({"value": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(context.coordinators.status.pending().power_limit_percentage, 100.0);
}

#[tokio::test]
async fn test_reapply_button() {
    let device = ScriptedDevice::new();
    let app = router(context(&device).await);
    device.push_status(json!({"mode": "DISABLED"}));

    let (status, body) = send(app, post("/button/reapply", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let requests = device.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].timeout_seconds, 900);
}
