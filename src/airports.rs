//! Airport coordinate directory
//!
//! Loaded once at startup, either from the data set compiled into the binary
//! or from a JSON file with the same layout, and shared read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::models::AirportRecord;
use crate::{FlightOnTimeError, Result};

const BUNDLED_AIRPORTS: &str = include_str!("../data/airports.json");

/// Case-insensitive IATA lookup table
#[derive(Debug, Clone)]
pub struct AirportDirectory {
    airports: HashMap<String, AirportRecord>,
}

impl AirportDirectory {
    /// Build a directory from records; later duplicates replace earlier ones
    #[must_use]
    pub fn new(records: Vec<AirportRecord>) -> Self {
        let airports = records
            .into_iter()
            .map(|record| (record.iata.to_uppercase(), record))
            .collect();
        Self { airports }
    }

    /// Directory compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_AIRPORTS)
    }

    /// Parse a JSON array of `{iata, lat, lon, name}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<AirportRecord> = serde_json::from_str(json)
            .map_err(|e| FlightOnTimeError::config(format!("invalid airport data: {e}")))?;
        Ok(Self::new(records))
    }

    /// Load from an override file, or the bundled data set when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let directory = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read airport file {}", path.display()))?;
                Self::from_json(&json)?
            }
            None => Self::bundled()?,
        };
        info!("Airport directory loaded: {} airports", directory.len());
        Ok(directory)
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.airports.contains_key(&code.trim().to_uppercase())
    }

    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&AirportRecord> {
        self.airports.get(&code.trim().to_uppercase())
    }

    /// Resolve both ends of a route, origin first.
    ///
    /// Fails with `AirportNotFound` naming the first unknown code.
    pub fn resolve_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<(&AirportRecord, &AirportRecord)> {
        let origin_record = self.lookup(origin).ok_or_else(|| {
            debug!("Unknown origin airport '{}'", origin);
            FlightOnTimeError::airport_not_found(origin)
        })?;
        let destination_record = self.lookup(destination).ok_or_else(|| {
            debug!("Unknown destination airport '{}'", destination);
            FlightOnTimeError::airport_not_found(destination)
        })?;
        Ok((origin_record, destination_record))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.airports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}
