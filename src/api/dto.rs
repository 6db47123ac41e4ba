//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::{FlightQuery, PredictionResponse};

/// Body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub aerolinea: String,
    pub origen: String,
    pub destino: String,
    #[serde(default)]
    pub fecha_partida: Option<String>,
}

impl PredictionRequest {
    pub fn to_query(&self) -> Result<FlightQuery> {
        FlightQuery::new(
            &self.aerolinea,
            &self.origen,
            &self.destino,
            self.fecha_partida.as_deref(),
        )
    }
}

/// Outcome of one entry of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub indice: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resultado: Option<PredictionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body returned by `POST /batch_predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub total: usize,
    pub exitosos: usize,
    pub fallidos: usize,
    pub resultados: Vec<BatchItem>,
}

impl BatchResponse {
    #[must_use]
    pub fn from_items(resultados: Vec<BatchItem>) -> Self {
        let exitosos = resultados.iter().filter(|i| i.resultado.is_some()).count();
        Self {
            total: resultados.len(),
            exitosos,
            fallidos: resultados.len() - exitosos,
            resultados,
        }
    }
}

/// Body returned by `GET /health` when the model is loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub modelo: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_departure() {
        let request: PredictionRequest =
            serde_json::from_str(r#"{"aerolinea": "dl", "origen": "ATL", "destino": "LAX"}"#)
                .unwrap();
        assert!(request.fecha_partida.is_none());
        let query = request.to_query().unwrap();
        assert_eq!(query.carrier, "DL");
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let request = PredictionRequest {
            aerolinea: "DL".to_string(),
            origen: " ".to_string(),
            destino: "LAX".to_string(),
            fecha_partida: None,
        };
        assert!(request.to_query().is_err());
    }

    #[test]
    fn test_batch_counts() {
        let response = BatchResponse::from_items(vec![
            BatchItem {
                indice: 0,
                resultado: None,
                error: Some("Aeropuerto 'ZZZ' no encontrado.".to_string()),
            },
            BatchItem {
                indice: 1,
                resultado: None,
                error: Some("Modelo ML no disponible".to_string()),
            },
        ]);
        assert_eq!(response.total, 2);
        assert_eq!(response.exitosos, 0);
        assert_eq!(response.fallidos, 2);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["resultados"][0].get("resultado").is_none());
    }
}
