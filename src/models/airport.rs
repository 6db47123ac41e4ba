//! Airport model for the coordinate directory

use serde::{Deserialize, Serialize};

/// One entry of the airport directory
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirportRecord {
    /// Three-letter IATA code, uppercase
    pub iata: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Airport name
    pub name: String,
}

impl AirportRecord {
    #[must_use]
    pub fn new(iata: &str, lat: f64, lon: f64, name: &str) -> Self {
        Self {
            iata: iata.to_uppercase(),
            lat,
            lon,
            name: name.to_string(),
        }
    }
}
