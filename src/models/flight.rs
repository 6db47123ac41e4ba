//! Flight query model

use serde::{Deserialize, Serialize};

use crate::{FlightOnTimeError, Result};

/// A single prediction query, normalized on construction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FlightQuery {
    /// Carrier IATA code, uppercase
    pub carrier: String,
    /// Carrier exactly as the caller sent it, echoed in response metadata
    pub requested_carrier: String,
    /// Origin airport IATA code, uppercase
    pub origin: String,
    /// Destination airport IATA code, uppercase
    pub destination: String,
    /// Departure timestamp as supplied by the caller (ISO-8601)
    pub departure: Option<String>,
}

impl FlightQuery {
    /// Build a query, trimming and uppercasing the codes.
    ///
    /// Blank codes are rejected. The departure string is kept verbatim; parsing
    /// and fallback happen in the temporal encoder.
    pub fn new(
        carrier: &str,
        origin: &str,
        destination: &str,
        departure: Option<&str>,
    ) -> Result<Self> {
        let requested_carrier = carrier.to_string();
        let carrier = normalize_code("aerolinea", carrier)?;
        let origin = normalize_code("origen", origin)?;
        let destination = normalize_code("destino", destination)?;

        Ok(Self {
            carrier,
            requested_carrier,
            origin,
            destination,
            departure: departure
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    /// Route label used in response metadata
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

fn normalize_code(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FlightOnTimeError::invalid_request(format!(
            "el campo '{field}' es obligatorio"
        )));
    }
    Ok(value.to_uppercase())
}
