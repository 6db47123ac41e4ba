//! Weather snapshot attached to prediction responses

use serde::{Deserialize, Serialize};

/// Temperature of the simulated snapshot in Celsius
pub const SIMULATED_TEMPERATURE: f64 = 20.0;
/// Relative humidity of the simulated snapshot in percent
pub const SIMULATED_HUMIDITY: u32 = 60;
/// Pressure of the simulated snapshot in hPa
pub const SIMULATED_PRESSURE: u32 = 1013;
/// Visibility of the simulated snapshot in meters
pub const SIMULATED_VISIBILITY: u32 = 10_000;
/// Wind speed of the simulated snapshot in m/s
pub const SIMULATED_WIND_SPEED: f64 = 5.0;
/// Condition label of the simulated snapshot
pub const SIMULATED_CONDITION: &str = "Clear";
/// Description of the simulated snapshot
pub const SIMULATED_DESCRIPTION: &str = "cielo claro";

/// Current weather at one airport. Never fed to the classifier.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    /// Relative humidity in percent
    #[serde(rename = "humedad")]
    pub humidity: u32,
    /// Atmospheric pressure in hPa
    #[serde(rename = "presion")]
    pub pressure: u32,
    /// Visibility in meters
    #[serde(rename = "visibilidad")]
    pub visibility: u32,
    /// Wind speed in m/s
    #[serde(rename = "viento_velocidad")]
    pub wind_speed: f64,
    /// Short condition label (e.g. "Clear", "Rain")
    #[serde(rename = "condicion")]
    pub condition: String,
    /// Localized description
    #[serde(rename = "descripcion")]
    pub description: String,
}

impl WeatherSnapshot {
    /// Fixed snapshot used whenever the provider cannot deliver real data
    #[must_use]
    pub fn simulated() -> Self {
        Self {
            temperature: SIMULATED_TEMPERATURE,
            humidity: SIMULATED_HUMIDITY,
            pressure: SIMULATED_PRESSURE,
            visibility: SIMULATED_VISIBILITY,
            wind_speed: SIMULATED_WIND_SPEED,
            condition: SIMULATED_CONDITION.to_string(),
            description: SIMULATED_DESCRIPTION.to_string(),
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }
}
