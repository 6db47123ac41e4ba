use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flightontime::api::AppState;
use flightontime::config::LoggingConfig;
use flightontime::{
    AirportDirectory, FlightOnTimeConfig, OpenWeatherClient, PredictionService,
    WeatherEnrichment, load_model, web,
};

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = FlightOnTimeConfig::load_from_path(config_path.as_deref())?;
    init_tracing(&config.logging);

    info!("Starting FlightOnTime v{}", flightontime::VERSION);

    let airports = Arc::new(AirportDirectory::load(config.airports.path.as_deref())?);

    let model = match load_model(&config.model.path) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            error!("Model unavailable, predictions will return 503: {:#}", e);
            None
        }
    };

    let provider = Arc::new(OpenWeatherClient::new(&config.weather)?);
    let weather = WeatherEnrichment::new(provider, config.weather.timeout());

    let service = PredictionService::new(airports, model, weather);
    let state = AppState::new(service, config.batch.max_items);

    web::run(&config, state).await
}
