//! Heating modes and the mode change request

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating mode of the heating controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    UnrestrictedHeating,
    ExportSurplusHeating,
    SolarAndGridHeating,
    Disabled,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::UnrestrictedHeating,
        Mode::ExportSurplusHeating,
        Mode::SolarAndGridHeating,
        Mode::Disabled,
    ];

    /// Wire name, as reported by `/status` and accepted by `/mode`
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::UnrestrictedHeating => "UNRESTRICTED_HEATING",
            Mode::ExportSurplusHeating => "EXPORT_SURPLUS_HEATING",
            Mode::SolarAndGridHeating => "SOLAR_AND_GRID_HEATING",
            Mode::Disabled => "DISABLED",
        }
    }

    /// English display label
    pub fn label(&self) -> &'static str {
        match self {
            Mode::UnrestrictedHeating => "Unrestricted Heating",
            Mode::ExportSurplusHeating => "Export Surplus Heating",
            Mode::SolarAndGridHeating => "Solar and Grid Heating",
            Mode::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("Invalid mode: {}", s))
    }
}

/// Body of `POST /mode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
    pub power_limit_percentage: f64,
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setpoint: Option<f64>,
}

impl ModeRequest {
    pub fn new(mode: Mode, power_limit_percentage: f64, timeout_seconds: u64) -> Self {
        Self {
            mode,
            power_limit_percentage,
            timeout_seconds,
            setpoint: None,
        }
    }

    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = Some(setpoint);
        self
    }
}
