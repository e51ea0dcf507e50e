//! Device client tests against an in-process fake device

mod support;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use support::{unreachable_base_url, Canned, FakeDevice};
use wattrix::errors::WattrixError;
use wattrix::http::client::HttpClient;
use wattrix::http::device::DeviceApi;
use wattrix::models::mode::{Mode, ModeRequest};

fn client(base_url: &str) -> HttpClient {
    HttpClient::new(base_url, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_get_status_returns_object() {
    let device = FakeDevice::start().await;
    device.set_status(Canned::json(json!({"mode": "DISABLED", "current_power": 0})));

    let status = assert_ok!(client(&device.base_url()).get_status().await);
    assert_eq!(status.get_str("mode"), Some("DISABLED"));
    assert_eq!(status.get("current_power"), Some(&json!(0)));
    assert_eq!(device.status_hits(), 1);
}

#[tokio::test]
async fn test_info_reads_hit_their_paths() {
    let device = FakeDevice::start().await;
    let client = client(&device.base_url());

    let serial = assert_ok!(client.get_serial_number().await);
    assert_eq!(serial.get_str("serial_number"), Some("WX-0042"));

    let version = assert_ok!(client.get_version().await);
    assert_eq!(version.get_str("version"), Some("1.4.2"));

    let info = assert_ok!(client.get_device_info().await);
    assert_eq!(info.get_str("model"), Some("Wattrix One"));
}

#[tokio::test]
async fn test_non_200_is_fetch_error() {
    let device = FakeDevice::start().await;
    device.set_status(Canned::error(StatusCode::SERVICE_UNAVAILABLE));

    let err = assert_err!(client(&device.base_url()).get_status().await);
    assert!(matches!(err, WattrixError::FetchError(_)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_other_2xx_is_not_success() {
    let device = FakeDevice::start().await;
    device.set_version(Canned::raw(StatusCode::ACCEPTED, r#"{"version":"1.4.2"}"#));

    let err = assert_err!(client(&device.base_url()).get_version().await);
    assert!(matches!(err, WattrixError::FetchError(_)));
}

#[tokio::test]
async fn test_non_object_body_is_fetch_error() {
    let device = FakeDevice::start().await;
    device.set_status(Canned::raw(StatusCode::OK, "[1, 2, 3]"));

    let err = assert_err!(client(&device.base_url()).get_status().await);
    assert!(matches!(err, WattrixError::FetchError(_)));
    assert!(err.to_string().contains("an array"));
}

#[tokio::test]
async fn test_invalid_json_is_fetch_error() {
    let device = FakeDevice::start().await;
    device.set_status(Canned::raw(StatusCode::OK, "not json"));

    let err = assert_err!(client(&device.base_url()).get_status().await);
    assert!(matches!(err, WattrixError::FetchError(_)));
}

#[tokio::test]
async fn test_unreachable_device_is_fetch_error() {
    let base_url = unreachable_base_url().await;

    let err = assert_err!(client(&base_url).get_status().await);
    assert!(matches!(err, WattrixError::FetchError(_)));
}

#[tokio::test]
async fn test_set_mode_without_setpoint() {
    let device = FakeDevice::start().await;
    let request = ModeRequest::new(Mode::UnrestrictedHeating, 80.0, 600);

    assert!(client(&device.base_url()).set_mode(&request).await);

    let bodies = device.mode_requests();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["mode"], json!("UNRESTRICTED_HEATING"));
    assert_eq!(bodies[0]["power_limit_percentage"], json!(80.0));
    assert_eq!(bodies[0]["timeout_seconds"], json!(600));
    assert!(bodies[0].get("setpoint").is_none());
}

#[tokio::test]
async fn test_set_mode_with_numeric_setpoint() {
    let device = FakeDevice::start().await;
    let request = ModeRequest::new(Mode::SolarAndGridHeating, 100.0, 900).with_setpoint(1500.0);

    assert!(client(&device.base_url()).set_mode(&request).await);

    let bodies = device.mode_requests();
    assert_eq!(bodies[0]["mode"], json!("SOLAR_AND_GRID_HEATING"));
    assert!(bodies[0]["setpoint"].is_number());
    assert_eq!(bodies[0]["setpoint"], json!(1500.0));
}

#[tokio::test]
async fn test_set_mode_rejected_by_device() {
    let device = FakeDevice::start().await;
    device.set_mode_status(StatusCode::INTERNAL_SERVER_ERROR);
    let request = ModeRequest::new(Mode::Disabled, 100.0, 900);

    assert!(!client(&device.base_url()).set_mode(&request).await);
    assert_eq!(device.mode_requests().len(), 1);
}

#[tokio::test]
async fn test_set_mode_unreachable_device() {
    let base_url = unreachable_base_url().await;
    let request = ModeRequest::new(Mode::Disabled, 100.0, 900);

    assert!(!client(&base_url).set_mode(&request).await);
}
