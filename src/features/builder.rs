//! Raw feature construction for one query

use chrono::NaiveDateTime;

use super::{FeatureMap, FeatureValue, TemporalFeatures, columns};
use crate::models::FlightQuery;

/// Build the raw feature map for a query.
///
/// The tail number is never known at query time; a `<carrier>001`
/// placeholder stands in for it.
#[must_use]
pub fn build_raw_features(
    query: &FlightQuery,
    departure: NaiveDateTime,
    distance_km: f64,
) -> FeatureMap {
    let mut features = FeatureMap::new();
    TemporalFeatures::encode(departure, distance_km).insert_into(&mut features);

    features.insert(
        columns::DISTANCE.to_string(),
        FeatureValue::Numeric(distance_km),
    );
    features.insert(
        columns::CARRIER.to_string(),
        FeatureValue::from(query.carrier.as_str()),
    );
    features.insert(
        columns::ORIGIN.to_string(),
        FeatureValue::from(query.origin.as_str()),
    );
    features.insert(
        columns::DESTINATION.to_string(),
        FeatureValue::from(query.destination.as_str()),
    );
    features.insert(
        columns::TAIL_NUMBER.to_string(),
        FeatureValue::Categorical(format!("{}001", query.carrier)),
    );

    features
}
