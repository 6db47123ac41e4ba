//! Prediction result and response models

use serde::{Deserialize, Serialize};

use super::WeatherSnapshot;

/// Validated classifier output for one request
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    /// 0 = on time, 1 = delayed
    pub label: u8,
    /// Probability of the delayed class, in [0, 1]
    pub delay_probability: f64,
    /// Probability of the predicted class, in [0, 1]
    pub confidence: f64,
}

/// Routing metadata echoed back to the caller
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionMetadata {
    pub aerolinea: String,
    pub ruta: String,
    pub origen_nombre: String,
    pub destino_nombre: String,
    pub fecha_partida: Option<String>,
    pub timestamp_prediccion: String,
}

/// Full response of a prediction request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub prediccion: u8,
    pub probabilidad_retraso: f64,
    pub confianza: f64,
    pub distancia_km: f64,
    pub clima_origen: WeatherSnapshot,
    pub clima_destino: WeatherSnapshot,
    pub metadata: PredictionMetadata,
}

/// Round to four decimals as reported in responses
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
