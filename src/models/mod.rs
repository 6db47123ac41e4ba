//! Data models for the FlightOnTime service
//!
//! This module contains the core domain models organized by concern:
//! - Airport: directory entries with coordinates
//! - Flight: the normalized prediction query
//! - Weather: snapshots attached to responses
//! - Prediction: validated classifier output and the response payload

pub mod airport;
pub mod flight;
pub mod prediction;
pub mod weather;

// Re-export all public types for convenient access
pub use airport::AirportRecord;
pub use flight::FlightQuery;
pub use prediction::{PredictionMetadata, PredictionResponse, PredictionResult};
pub use weather::WeatherSnapshot;
