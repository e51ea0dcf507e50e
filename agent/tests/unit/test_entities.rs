//! Entity tests: mode selector, pending numbers, re-apply button and sensors

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use support::ScriptedDevice;
use wattrix::entities::button::ReapplyButton;
use wattrix::entities::number::{self, PendingNumber};
use wattrix::entities::select::ModeSelect;
use wattrix::entities::sensor::{OnlineSensor, Sensor, STATUS_SENSORS};
use wattrix::entities::{Entity, EntityKind};
use wattrix::errors::WattrixError;
use wattrix::http::device::DeviceApi;
use wattrix::models::mode::Mode;
use wattrix::sync::coordinator::{Coordinator, Options};
use wattrix::sync::source::{DeviceRead, ReadKind};

const SERIAL: &str = "WX-0042";

struct Fixture {
    device: Arc<ScriptedDevice>,
    coordinator: Arc<Coordinator>,
}

impl Fixture {
    fn new() -> Self {
        let device = ScriptedDevice::new();
        let api: Arc<dyn DeviceApi> = device.clone();
        let coordinator = Arc::new(Coordinator::new(
            Options::default(),
            Arc::new(DeviceRead::new(api, ReadKind::Status)),
        ));
        Self { device, coordinator }
    }

    async fn with_status(status: serde_json::Value) -> Self {
        let fixture = Self::new();
        fixture.device.push_status(status);
        fixture.coordinator.first_refresh().await.unwrap();
        fixture
    }

    fn api(&self) -> Arc<dyn DeviceApi> {
        self.device.clone()
    }

    fn select(&self) -> ModeSelect {
        ModeSelect::new(self.api(), self.coordinator.clone(), SERIAL)
    }

    fn button(&self) -> ReapplyButton {
        ReapplyButton::new(self.api(), self.coordinator.clone(), SERIAL)
    }

    fn number(&self, description: number::NumberDescription) -> PendingNumber {
        PendingNumber::new(self.coordinator.clone(), description, SERIAL)
    }
}

// ============================== MODE SELECTOR =================================== //

#[tokio::test]
async fn test_select_sends_pending_values() {
    let fixture = Fixture::with_status(json!({
        "mode": "DISABLED",
        "power_limit_percentage": 60,
        "timeout_seconds": 300,
    }))
    .await;
    fixture.device.push_status(json!({"mode": "SOLAR_AND_GRID_HEATING"}));
    assert_ok!(fixture.number(number::SETPOINT).set_value(1200.0));

    let applied = assert_ok!(fixture.select().select_option("SOLAR_AND_GRID_HEATING").await);
    assert!(applied);

    let requests = fixture.device.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].mode, Mode::SolarAndGridHeating);
    assert_eq!(requests[0].power_limit_percentage, 60.0);
    assert_eq!(requests[0].timeout_seconds, 300);
    assert_eq!(requests[0].setpoint, Some(1200.0));

    assert_eq!(
        fixture.select().current_option(),
        Some(Mode::SolarAndGridHeating)
    );
    // initial read plus the refresh requested after the change
    assert_eq!(fixture.coordinator.executions(), 2);
}

#[tokio::test]
async fn test_select_rejected_leaves_snapshot() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED", "current_power": 0})).await;
    fixture.device.accept_mode.store(false, Ordering::SeqCst);
    let before = fixture.coordinator.data();

    let applied = assert_ok!(fixture.select().select_option("UNRESTRICTED_HEATING").await);
    assert!(!applied);

    assert_eq!(fixture.coordinator.data(), before);
    assert_eq!(fixture.coordinator.executions(), 1);
}

#[tokio::test]
async fn test_select_invalid_option() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED"})).await;

    let err = assert_err!(fixture.select().select_option("TURBO").await);
    assert!(matches!(err, WattrixError::ValidationError(_)));
    assert!(fixture.device.requests().is_empty());
}

#[tokio::test]
async fn test_select_state_and_attributes() {
    let fixture = Fixture::with_status(json!({
        "mode": "EXPORT_SURPLUS_HEATING",
        "timeout_seconds": 900,
    }))
    .await;
    let select = fixture.select();

    assert_eq!(select.unique_id(), "wattrix_mode_WX-0042");
    assert_eq!(select.options().len(), 4);

    let state = select.state();
    assert_eq!(state.kind, EntityKind::Select);
    assert_eq!(state.value, Some(json!("EXPORT_SURPLUS_HEATING")));
    assert_eq!(state.attributes["power_limit_percentage"], json!(100.0));
    assert_eq!(state.attributes["timeout_seconds"], json!(900));
    assert_eq!(state.attributes["setpoint"], json!(null));
    assert_eq!(state.attributes["serial_number"], json!(SERIAL));
}

// ============================== PENDING NUMBERS ================================= //

#[tokio::test]
async fn test_number_edits_pending_value() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED"})).await;
    let percentage = fixture.number(number::PERCENTAGE);

    assert_ok!(percentage.set_value(45.0));

    assert_eq!(percentage.native_value(), 45.0);
    assert_eq!(fixture.coordinator.pending().power_limit_percentage, 45.0);
    assert!(!fixture.coordinator.data().contains_key("power_limit_percentage"));
    assert_eq!(percentage.unique_id(), "wattrix_mode_percentage_WX-0042");
}

#[tokio::test]
async fn test_number_rejects_out_of_range() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED"})).await;
    let percentage = fixture.number(number::PERCENTAGE);

    let err = assert_err!(percentage.set_value(150.0));
    assert!(matches!(err, WattrixError::ValidationError(_)));
    assert_err!(percentage.set_value(-1.0));
    assert_err!(percentage.set_value(f64::NAN));

    assert_eq!(percentage.native_value(), 100.0);
}

#[tokio::test]
async fn test_timeout_number_reports_whole_seconds() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED"})).await;
    let timeout = fixture.number(number::TIMEOUT);

    assert_eq!(timeout.value(), Some(json!(900)));
    assert_ok!(timeout.set_value(1234.4));
    assert_eq!(timeout.value(), Some(json!(1234)));
    assert_eq!(timeout.unit(), Some("s"));
}

// ============================== RE-APPLY BUTTON ================================= //

#[tokio::test]
async fn test_reapply_resends_current_mode() {
    let fixture = Fixture::with_status(json!({
        "mode": "UNRESTRICTED_HEATING",
        "power_limit_percentage": 80,
    }))
    .await;
    fixture.device.push_status(json!({"mode": "UNRESTRICTED_HEATING"}));

    assert!(fixture.button().press().await);

    let requests = fixture.device.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].mode, Mode::UnrestrictedHeating);
    assert_eq!(requests[0].power_limit_percentage, 80.0);
    assert_eq!(requests[0].setpoint, Some(200.0));
}

#[tokio::test]
async fn test_reapply_without_known_mode() {
    let fixture = Fixture::new();

    assert!(!fixture.button().press().await);
    assert!(fixture.device.requests().is_empty());
}

#[tokio::test]
async fn test_reapply_with_unknown_mode() {
    let fixture = Fixture::with_status(json!({"mode": "TURBO"})).await;

    assert!(!fixture.button().press().await);
    assert!(fixture.device.requests().is_empty());
}

#[tokio::test]
async fn test_reapply_rejected_by_device() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED"})).await;
    fixture.device.accept_mode.store(false, Ordering::SeqCst);

    assert!(!fixture.button().press().await);
    assert_eq!(fixture.device.requests().len(), 1);
}

// ================================== SENSORS ===================================== //

#[tokio::test]
async fn test_sensors_follow_availability() {
    let fixture = Fixture::with_status(json!({"mode": "DISABLED", "current_power": 340})).await;
    fixture.device.push_failure("connection refused");

    let power = Sensor::new(fixture.coordinator.clone(), STATUS_SENSORS[1], SERIAL);
    let online = OnlineSensor::new(fixture.coordinator.clone(), SERIAL);

    assert_eq!(power.state().value, Some(json!(340)));
    assert_eq!(power.unit(), Some("W"));
    assert_eq!(online.state().value, Some(json!(true)));

    assert_err!(fixture.coordinator.refresh().await);

    let state = power.state();
    assert!(!state.available);
    assert_eq!(state.value, None);
    assert_eq!(online.state().value, Some(json!(false)));
    assert!(online.state().available);
}
