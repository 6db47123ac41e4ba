//! Great-circle distance between airports

use haversine::{Location as HaversineLocation, Units, distance as haversine_distance};

use crate::models::AirportRecord;

/// Haversine distance in kilometers (Earth radius 6371 km)
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = HaversineLocation {
        latitude: lat1,
        longitude: lon1,
    };
    let to = HaversineLocation {
        latitude: lat2,
        longitude: lon2,
    };
    haversine_distance(from, to, Units::Kilometers)
}

/// Distance between two directory entries
#[must_use]
pub fn airport_distance_km(from: &AirportRecord, to: &AirportRecord) -> f64 {
    distance_km(from.lat, from.lon, to.lat, to.lon)
}
