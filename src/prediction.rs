//! End-to-end prediction for one flight query
//!
//! A request moves through fixed stages:
//! `Validate → ComputeDistance → FetchWeather → BuildFeatures → Classify →
//! ValidateOutput → Respond`. Any stage may end the request early in one of
//! the terminal classes of [`ErrorClass`](crate::ErrorClass).

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, instrument};

use crate::airports::AirportDirectory;
use crate::classifier::DelayModel;
use crate::features::{build_raw_features, parse_departure};
use crate::geo::airport_distance_km;
use crate::models::{FlightQuery, PredictionMetadata, PredictionResponse};
use crate::weather::WeatherEnrichment;
use crate::{ErrorClass, FlightOnTimeError, Result};

/// Stage a request is in, used to tag logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStage {
    Validate,
    ComputeDistance,
    FetchWeather,
    BuildFeatures,
    Classify,
    ValidateOutput,
    Respond,
}

impl fmt::Display for PredictionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::ComputeDistance => "compute_distance",
            Self::FetchWeather => "fetch_weather",
            Self::BuildFeatures => "build_features",
            Self::Classify => "classify",
            Self::ValidateOutput => "validate_output",
            Self::Respond => "respond",
        };
        f.write_str(name)
    }
}

/// Shared, read-only prediction pipeline
#[derive(Clone)]
pub struct PredictionService {
    airports: Arc<AirportDirectory>,
    model: Option<Arc<DelayModel>>,
    weather: WeatherEnrichment,
}

impl PredictionService {
    #[must_use]
    pub fn new(
        airports: Arc<AirportDirectory>,
        model: Option<Arc<DelayModel>>,
        weather: WeatherEnrichment,
    ) -> Self {
        Self {
            airports,
            model,
            weather,
        }
    }

    #[must_use]
    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Predict using the current local time as the fallback departure
    pub async fn predict(&self, query: &FlightQuery) -> Result<PredictionResponse> {
        self.predict_at(query, Local::now().naive_local()).await
    }

    /// Predict with an explicit fallback departure time
    #[instrument(skip(self, now), fields(carrier = %query.carrier, route = %query.route()))]
    pub async fn predict_at(
        &self,
        query: &FlightQuery,
        now: NaiveDateTime,
    ) -> Result<PredictionResponse> {
        let result = self.run(query, now).await;
        if let Err((stage, e)) = &result {
            match e.class() {
                ErrorClass::Failed => error!("Prediction failed at {}: {}", stage, e),
                ErrorClass::Unavailable | ErrorClass::Rejected => {
                    info!("Prediction ended at {}: {}", stage, e);
                }
            }
        }
        result.map_err(|(_, e)| e)
    }

    async fn run(
        &self,
        query: &FlightQuery,
        now: NaiveDateTime,
    ) -> std::result::Result<PredictionResponse, (PredictionStage, FlightOnTimeError)> {
        use PredictionStage as Stage;

        let (origin, destination) = self
            .airports
            .resolve_route(&query.origin, &query.destination)
            .map_err(|e| (Stage::Validate, e))?;

        let distance_km = airport_distance_km(origin, destination);
        debug!("{}: {:.2} km", Stage::ComputeDistance, distance_km);

        let (origin_weather, destination_weather) =
            self.weather.for_route(origin, destination).await;

        let model = self
            .model
            .clone()
            .ok_or((Stage::Classify, FlightOnTimeError::ModelUnavailable))?;

        let departure = parse_departure(query.departure.as_deref(), now);
        let raw = build_raw_features(query, departure, distance_km);
        let vector = model.vectorize(raw).map_err(|e| (Stage::BuildFeatures, e))?;

        // CPU-bound; no timeout on the classifier call
        let result = tokio::task::spawn_blocking(move || model.classify(&vector))
            .await
            .map_err(|e| {
                (
                    Stage::Classify,
                    FlightOnTimeError::inference(format!("classifier task failed: {e}")),
                )
            })?
            .map_err(|e| {
                let stage = match e {
                    FlightOnTimeError::InvalidModelOutput { .. } => Stage::ValidateOutput,
                    _ => Stage::Classify,
                };
                (stage, e)
            })?;

        info!(
            "{}: label {} (p_delay {:.4}, confidence {:.4})",
            Stage::Respond,
            result.label,
            result.delay_probability,
            result.confidence
        );

        Ok(PredictionResponse {
            prediccion: result.label,
            probabilidad_retraso: result.delay_probability,
            confianza: result.confidence,
            distancia_km: distance_km,
            clima_origen: origin_weather,
            clima_destino: destination_weather,
            metadata: PredictionMetadata {
                aerolinea: query.requested_carrier.clone(),
                ruta: query.route(),
                origen_nombre: origin.name.clone(),
                destino_nombre: destination.name.clone(),
                fecha_partida: query.departure.clone(),
                timestamp_prediccion: Local::now()
                    .naive_local()
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string(),
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Service wiring shared by unit and API tests

    use std::time::Duration;

    use super::*;
    use crate::classifier::testing::FixedClassifier;
    use crate::features::ExpectedFeatureSchema;
    use crate::weather::WeatherProvider;

    pub fn service_with(
        classifier: Option<FixedClassifier>,
        provider: Arc<dyn WeatherProvider>,
        timeout: Duration,
    ) -> PredictionService {
        let model = classifier.map(|classifier| {
            let encoders = crate::classifier::ModelArtifact::from_json(include_str!(
                "../artifacts/delay_model.json"
            ))
            .and_then(|artifact| artifact.into_model())
            .map(|model| model.encoders().clone())
            .unwrap();
            Arc::new(
                DelayModel::new(
                    Box::new(classifier),
                    ExpectedFeatureSchema::standard(),
                    encoders,
                )
                .unwrap(),
            )
        });
        PredictionService::new(
            Arc::new(AirportDirectory::bundled().unwrap()),
            model,
            WeatherEnrichment::new(provider, timeout),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::testing::service_with;
    use super::*;
    use crate::classifier::ModelArtifact;
    use crate::classifier::testing::FixedClassifier;
    use crate::models::WeatherSnapshot;
    use crate::weather::testing::{Behaviour, ScriptedProvider, rainy};

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-02-01T09:15:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn query(origin: &str, destination: &str) -> FlightQuery {
        FlightQuery::new("DL", origin, destination, Some("2026-01-20T14:30:00")).unwrap()
    }

    #[tokio::test]
    async fn test_atl_to_lax_prediction() {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Succeed(rainy())));
        let service = service_with(
            Some(FixedClassifier::new(vec![0.7, 0.3], 0)),
            provider,
            Duration::from_secs(5),
        );

        let response = service.predict_at(&query("ATL", "LAX"), now()).await.unwrap();
        assert!((response.distancia_km - 3124.0).abs() <= 5.0);
        assert_eq!(response.prediccion, 0);
        assert_eq!(response.probabilidad_retraso, 0.3);
        assert_eq!(response.confianza, 0.7);
        assert_eq!(response.clima_origen, rainy());
        assert_eq!(response.metadata.ruta, "ATL → LAX");
        assert_eq!(response.metadata.aerolinea, "DL");
        assert_eq!(
            response.metadata.fecha_partida.as_deref(),
            Some("2026-01-20T14:30:00")
        );
        assert!(response.metadata.origen_nombre.contains("Atlanta"));
    }

    #[tokio::test]
    async fn test_tuesday_departure_is_not_weekend() {
        let model = ModelArtifact::from_json(include_str!("../artifacts/delay_model.json"))
            .unwrap()
            .into_model()
            .unwrap();
        let departure = parse_departure(Some("2026-01-20T14:30:00"), now());
        let raw = build_raw_features(&query("ATL", "LAX"), departure, 3125.8);
        let vector = model.vectorize(raw).unwrap();
        assert_eq!(vector.get("es_fin_de_semana"), Some(0.0));
        assert_eq!(vector.get("DAY_OF_WEEK"), Some(1.0));
        assert_eq!(vector.len(), 16);
    }

    #[tokio::test]
    async fn test_unknown_origin_stops_before_weather_and_model() {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Succeed(rainy())));
        let classifier = FixedClassifier::new(vec![0.5, 0.5], 0);
        let classifier_calls = classifier.calls.clone();
        let service = service_with(Some(classifier), provider.clone(), Duration::from_secs(5));

        let err = service
            .predict_at(&query("ZZZ", "LAX"), now())
            .await
            .unwrap_err();

        assert!(matches!(err, FlightOnTimeError::AirportNotFound { ref code } if code == "ZZZ"));
        assert_eq!(err.class(), ErrorClass::Rejected);
        assert_eq!(provider.calls(), 0);
        assert_eq!(classifier_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_weather_timeouts_still_predict() {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Hang));
        let service = service_with(
            Some(FixedClassifier::new(vec![0.4, 0.6], 1)),
            provider,
            Duration::from_millis(50),
        );

        let response = service.predict_at(&query("ATL", "LAX"), now()).await.unwrap();
        assert_eq!(response.clima_origen, WeatherSnapshot::simulated());
        assert_eq!(response.clima_destino, WeatherSnapshot::simulated());
        assert!((response.distancia_km - 3124.0).abs() <= 5.0);
        assert_eq!(response.prediccion, 1);
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Fail));
        let service = service_with(None, provider.clone(), Duration::from_secs(5));

        assert!(!service.is_model_loaded());
        let err = service
            .predict_at(&query("ATL", "LAX"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, FlightOnTimeError::ModelUnavailable));
        assert_eq!(err.class(), ErrorClass::Unavailable);
        // weather is fetched regardless of the model
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_garbage_output_fails() {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Fail));
        let service = service_with(
            Some(FixedClassifier::new(vec![f64::NAN, 0.5], 0)),
            provider,
            Duration::from_secs(5),
        );

        let err = service
            .predict_at(&query("ATL", "LAX"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, FlightOnTimeError::InvalidModelOutput { .. }));
        assert_eq!(err.class(), ErrorClass::Failed);
    }

    #[tokio::test]
    async fn test_identical_requests_give_identical_predictions() {
        let provider = Arc::new(ScriptedProvider::new(Behaviour::Fail));
        let artifact = ModelArtifact::from_json(include_str!("../artifacts/delay_model.json"))
            .unwrap()
            .into_model()
            .unwrap();
        let service = PredictionService::new(
            Arc::new(AirportDirectory::bundled().unwrap()),
            Some(Arc::new(artifact)),
            WeatherEnrichment::new(provider, Duration::from_secs(5)),
        );

        let first = service.predict_at(&query("JFK", "SFO"), now()).await.unwrap();
        let second = service.predict_at(&query("JFK", "SFO"), now()).await.unwrap();
        assert_eq!(first.prediccion, second.prediccion);
        assert_eq!(first.probabilidad_retraso, second.probabilidad_retraso);
        assert!((0.0..=1.0).contains(&first.probabilidad_retraso));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PredictionStage::FetchWeather.to_string(), "fetch_weather");
        assert_eq!(PredictionStage::ValidateOutput.to_string(), "validate_output");
    }
}
