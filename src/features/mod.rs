//! Feature pipeline between a flight query and the classifier
//!
//! Features move through three phases:
//! - raw: built from the query, distance and departure time ([`builder`])
//! - encoded: categorical labels replaced by encoder indices ([`encoding`])
//! - reconciled: exactly the classifier's columns, in order, as `f64` ([`schema`])

pub mod builder;
pub mod encoding;
pub mod schema;
pub mod temporal;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use builder::build_raw_features;
pub use encoding::{CategoricalEncoder, EncoderRegistry, Resolution, encode_features, resolve};
pub use schema::{ExpectedFeatureSchema, FeatureDescriptor, FeatureKind, reconcile};
pub use temporal::{TemporalFeatures, parse_departure};

/// Column names the classifier was trained with
pub mod columns {
    pub const MONTH_SIN: &str = "mes_sin";
    pub const MONTH_COS: &str = "mes_cos";
    pub const WEEKDAY_SIN: &str = "dia_semana_sin";
    pub const WEEKDAY_COS: &str = "dia_semana_cos";
    pub const WEEKEND: &str = "es_fin_de_semana";
    pub const MONTH: &str = "MONTH";
    pub const QUARTER: &str = "QUARTER";
    pub const DAY_OF_MONTH: &str = "DAY_OF_MONTH";
    pub const DAY_OF_WEEK: &str = "DAY_OF_WEEK";
    pub const DEPARTURE_TIME: &str = "CRS_DEP_TIME";
    pub const ARRIVAL_TIME: &str = "CRS_ARR_TIME";
    pub const DISTANCE: &str = "DISTANCE";
    pub const CARRIER: &str = "OP_UNIQUE_CARRIER";
    pub const ORIGIN: &str = "ORIGIN_AIRPORT_ID";
    pub const DESTINATION: &str = "DEST_AIRPORT_ID";
    pub const TAIL_NUMBER: &str = "TAIL_NUM";

    pub const TEMPERATURE: &str = "temperatura";
    pub const HUMIDITY: &str = "humedad";
    pub const PRESSURE: &str = "presion";
    pub const VISIBILITY: &str = "visibilidad";
    pub const WIND_SPEED: &str = "viento_velocidad";
    pub const CONDITION: &str = "condicion";

    /// Calendar and schedule columns; default to 0 when the builder omits them
    pub const TEMPORAL: [&str; 11] = [
        MONTH_SIN,
        MONTH_COS,
        WEEKDAY_SIN,
        WEEKDAY_COS,
        WEEKEND,
        MONTH,
        QUARTER,
        DAY_OF_MONTH,
        DAY_OF_WEEK,
        DEPARTURE_TIME,
        ARRIVAL_TIME,
    ];

    /// Numeric weather columns some classifiers were trained with
    pub const WEATHER_NUMERIC: [&str; 5] =
        [TEMPERATURE, HUMIDITY, PRESSURE, VISIBILITY, WIND_SPEED];

    /// Columns produced by the builder, in their natural order
    pub const STANDARD: [&str; 16] = [
        MONTH_SIN,
        MONTH_COS,
        WEEKDAY_SIN,
        WEEKDAY_COS,
        WEEKEND,
        MONTH,
        QUARTER,
        DAY_OF_MONTH,
        DAY_OF_WEEK,
        CARRIER,
        ORIGIN,
        DESTINATION,
        DEPARTURE_TIME,
        ARRIVAL_TIME,
        TAIL_NUMBER,
        DISTANCE,
    ];
}

/// A single feature value before reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    /// Canonical string form used for encoder lookups
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Numeric(value) if value.fract() == 0.0 && value.is_finite() => {
                format!("{value:.0}")
            }
            Self::Numeric(value) => value.to_string(),
            Self::Categorical(label) => label.trim().to_string(),
        }
    }

    /// Numeric view of the value, parsing categorical strings when possible.
    ///
    /// Labels such as `"NaN"` or `"inf"` are not numbers here.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Categorical(label) => label
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Categorical(value.to_string())
    }
}

/// Features keyed by column name, in raw or encoded phase
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Reconciled classifier input: schema names in schema order, all numeric
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn from_parts(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_forms() {
        assert_eq!(FeatureValue::Numeric(12.0).canonical(), "12");
        assert_eq!(FeatureValue::Numeric(0.5).canonical(), "0.5");
        assert_eq!(FeatureValue::from(" DL ").canonical(), "DL");
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(FeatureValue::Numeric(3.0).as_f64(), Some(3.0));
        assert_eq!(FeatureValue::from("42").as_f64(), Some(42.0));
        assert_eq!(FeatureValue::from("Clear").as_f64(), None);
        assert_eq!(FeatureValue::from("NaN").as_f64(), None);
        assert_eq!(FeatureValue::from("-inf").as_f64(), None);
    }

    #[test]
    fn test_feature_vector_lookup() {
        let vector = FeatureVector::from_parts(
            vec!["MONTH".to_string(), "QUARTER".to_string()],
            vec![1.0, 1.0],
        );
        assert_eq!(vector.get("QUARTER"), Some(1.0));
        assert_eq!(vector.get("TAIL_NUM"), None);
        assert_eq!(vector.len(), 2);
    }
}
