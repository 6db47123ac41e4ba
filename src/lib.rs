//! `FlightOnTime` - Flight delay prediction with live weather enrichment
//!
//! This library provides the airport directory, the feature pipeline feeding
//! the delay classifier, weather enrichment and the HTTP API around them.

pub mod airports;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod geo;
pub mod models;
pub mod prediction;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use airports::AirportDirectory;
pub use classifier::{Classifier, DelayModel, load_model};
pub use config::FlightOnTimeConfig;
pub use error::{ErrorClass, FlightOnTimeError};
pub use models::{AirportRecord, FlightQuery, PredictionResponse, PredictionResult, WeatherSnapshot};
pub use prediction::{PredictionService, PredictionStage};
pub use weather::{OpenWeatherClient, WeatherEnrichment, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FlightOnTimeError>;
