//! Weather enrichment for prediction responses
//!
//! Weather is informational only: the snapshots are attached to the response
//! and never fed to the classifier. Every failure is recovered locally with
//! the simulated snapshot, independently for each airport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::models::{AirportRecord, WeatherSnapshot};
use crate::{FlightOnTimeError, Result};

/// Source of current weather at a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot>;
}

/// OpenWeatherMap current-weather client
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    /// Create a new client from the weather settings
    pub fn new(config: &WeatherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("FlightOnTime/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        if config.api_key.is_none() {
            warn!("No weather API key configured, all weather will be simulated");
        }

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_url(&self, api_key: &str, lat: f64, lon: f64) -> Result<Url> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
                ("lang", "es".to_string()),
            ],
        )
        .map_err(|e| FlightOnTimeError::weather(format!("invalid weather URL: {e}")))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FlightOnTimeError::weather("no API key configured"))?;
        let url = self.request_url(api_key, lat, lon)?;
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FlightOnTimeError::weather(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlightOnTimeError::weather(format!(
                "OpenWeatherMap returned HTTP {status}"
            )));
        }

        let payload: openweather::CurrentWeather = response
            .json()
            .await
            .map_err(|e| FlightOnTimeError::weather(format!("invalid payload: {e}")))?;

        debug!(
            "Weather for {:.4},{:.4} retrieved in {:.3}s",
            lat,
            lon,
            start_time.elapsed().as_secs_f64()
        );
        payload.into_snapshot()
    }
}

/// Fetches weather for both ends of a route with a per-airport timeout
#[derive(Clone)]
pub struct WeatherEnrichment {
    provider: Arc<dyn WeatherProvider>,
    timeout: Duration,
}

impl WeatherEnrichment {
    #[must_use]
    pub fn new(provider: Arc<dyn WeatherProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Weather at one airport; the simulated snapshot on any failure
    pub async fn for_airport(&self, airport: &AirportRecord) -> WeatherSnapshot {
        let outcome = tokio::time::timeout(
            self.timeout,
            self.provider.fetch(airport.lat, airport.lon),
        )
        .await;

        match outcome {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!("Weather unavailable for {}, using simulated: {}", airport.iata, e);
                WeatherSnapshot::simulated()
            }
            Err(_) => {
                warn!(
                    "Weather for {} timed out after {:?}, using simulated",
                    airport.iata, self.timeout
                );
                WeatherSnapshot::simulated()
            }
        }
    }

    /// Weather at origin and destination, fetched concurrently
    #[instrument(skip_all, fields(origin = %origin.iata, destination = %destination.iata))]
    pub async fn for_route(
        &self,
        origin: &AirportRecord,
        destination: &AirportRecord,
    ) -> (WeatherSnapshot, WeatherSnapshot) {
        let (origin_weather, destination_weather) =
            tokio::join!(self.for_airport(origin), self.for_airport(destination));
        info!(
            "Weather: {} {} / {} {}",
            origin.iata,
            origin_weather.format_temperature(),
            destination.iata,
            destination_weather.format_temperature()
        );
        (origin_weather, destination_weather)
    }
}

/// OpenWeatherMap response structures
mod openweather {
    use serde::Deserialize;

    use crate::models::WeatherSnapshot;
    use crate::models::weather::SIMULATED_VISIBILITY;
    use crate::{FlightOnTimeError, Result};

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        #[serde(default)]
        pub weather: Vec<Condition>,
        pub main: MainReadings,
        pub visibility: Option<f64>,
        pub wind: Wind,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub main: String,
        pub description: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct MainReadings {
        pub temp: f64,
        pub humidity: f64,
        pub pressure: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Wind {
        pub speed: f64,
    }

    impl CurrentWeather {
        pub fn into_snapshot(self) -> Result<WeatherSnapshot> {
            let condition = self
                .weather
                .into_iter()
                .next()
                .ok_or_else(|| FlightOnTimeError::weather("payload has no weather condition"))?;

            Ok(WeatherSnapshot {
                temperature: self.main.temp,
                humidity: self.main.humidity.round() as u32,
                pressure: self.main.pressure.round() as u32,
                visibility: self
                    .visibility
                    .map_or(SIMULATED_VISIBILITY, |v| v.round() as u32),
                wind_speed: self.wind.speed,
                condition: condition.main,
                description: condition.description,
            })
        }
    }
}
