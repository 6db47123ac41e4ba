//! HTTP API: single and batch prediction plus health

pub mod dto;
pub mod error;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Local;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::models::PredictionResponse;
use crate::prediction::PredictionService;
use crate::{FlightOnTimeError, Result};

pub use dto::{BatchItem, BatchResponse, HealthResponse, PredictionRequest};
pub use error::{ApiError, ErrorBody};

const MODEL_UNAVAILABLE_DETAIL: &str =
    "Modelo ML no disponible. El servicio no puede procesar predicciones.";

/// Shared state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    /// Maximum number of entries accepted by `/batch_predict`
    pub batch_limit: usize,
}

impl AppState {
    #[must_use]
    pub fn new(service: PredictionService, batch_limit: usize) -> Self {
        Self {
            service,
            batch_limit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict_internal", post(predict))
        .route("/batch_predict", post(batch_predict))
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
) -> std::result::Result<Json<HealthResponse>, ApiError> {
    if !state.service.is_model_loaded() {
        warn!("Health check failed: model not loaded");
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, MODEL_UNAVAILABLE_DETAIL));
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        modelo: "cargado".to_string(),
        timestamp: Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
    }))
}

async fn predict_one(
    service: &PredictionService,
    request: &PredictionRequest,
) -> Result<PredictionResponse> {
    let query = request.to_query()?;
    service.predict(&query).await
}

#[instrument(skip_all)]
async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> std::result::Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload?;
    info!(
        "Prediction request: {} {} → {}",
        request.aerolinea, request.origen, request.destino
    );
    let response = predict_one(&state.service, &request).await?;
    Ok(Json(response))
}

#[instrument(skip_all)]
async fn batch_predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<PredictionRequest>>, JsonRejection>,
) -> std::result::Result<Json<BatchResponse>, ApiError> {
    let Json(requests) = payload?;
    if requests.len() > state.batch_limit {
        return Err(FlightOnTimeError::invalid_request(format!(
            "máximo {} vuelos por lote, recibidos {}",
            state.batch_limit,
            requests.len()
        ))
        .into());
    }
    info!("Batch prediction request with {} flights", requests.len());

    let outcomes = join_all(
        requests
            .iter()
            .map(|request| predict_one(&state.service, request)),
    )
    .await;

    let items = outcomes
        .into_iter()
        .enumerate()
        .map(|(indice, outcome)| match outcome {
            Ok(response) => BatchItem {
                indice,
                resultado: Some(response),
                error: None,
            },
            Err(e) => BatchItem {
                indice,
                resultado: None,
                error: Some(e.user_message()),
            },
        })
        .collect();

    let response = BatchResponse::from_items(items);
    info!(
        "Batch finished: {} ok, {} failed",
        response.exitosos, response.fallidos
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::classifier::testing::FixedClassifier;
    use crate::prediction::testing::service_with;
    use crate::weather::testing::{Behaviour, ScriptedProvider, rainy};

    fn app(classifier: FixedClassifier) -> Router {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Succeed(rainy())));
        let service = service_with(Some(classifier), provider, Duration::from_secs(5));
        router(AppState::new(service, 10))
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_model_output_is_opaque_500() {
        let app = app(FixedClassifier::new(vec![f64::NAN, 0.5], 1));
        let response = app
            .oneshot(predict_request(
                r#"{"aerolinea": "DL", "origen": "ATL", "destino": "LAX"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.detail, "Error en predicción del modelo");
    }

    #[tokio::test]
    async fn test_live_weather_reaches_response() {
        let app = app(FixedClassifier::new(vec![0.3, 0.7], 1));
        let response = app
            .oneshot(predict_request(
                r#"{"aerolinea": "AA", "origen": "JFK", "destino": "MIA"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: PredictionResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.prediccion, 1);
        assert_eq!(body.probabilidad_retraso, 0.7);
        assert_eq!(body.confianza, 0.7);
        assert_eq!(body.clima_origen, rainy());
    }
}
