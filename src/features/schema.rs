//! Expected feature schema and reconciliation
//!
//! The schema is the exact column list, in order, that the classifier was
//! trained on. Reconciliation turns an encoded feature map into a
//! [`FeatureVector`] that matches it: defaults for missing defaultable columns,
//! extras dropped, schema order, everything coerced to `f64`.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{EncoderRegistry, FeatureMap, FeatureValue, FeatureVector, columns};
use crate::models::weather::{
    SIMULATED_CONDITION, SIMULATED_HUMIDITY, SIMULATED_PRESSURE, SIMULATED_TEMPERATURE,
    SIMULATED_VISIBILITY, SIMULATED_WIND_SPEED,
};
use crate::{FlightOnTimeError, Result};

/// How a column behaves when the builder did not produce it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    NumericRequired,
    NumericDefaultable,
    CategoricalRequired,
    CategoricalDefaultable,
}

impl FeatureKind {
    /// Kind for a column listed by name only
    #[must_use]
    pub fn infer(name: &str) -> Self {
        if columns::TEMPORAL.contains(&name) || columns::WEATHER_NUMERIC.contains(&name) {
            Self::NumericDefaultable
        } else if name == columns::CONDITION {
            Self::CategoricalDefaultable
        } else if name == columns::DISTANCE {
            Self::NumericRequired
        } else {
            Self::CategoricalRequired
        }
    }
}

/// One schema column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureDescriptor {
    #[must_use]
    pub fn new<S: Into<String>>(name: S, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Descriptor with its kind inferred from the name
    #[must_use]
    pub fn inferred<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        let kind = FeatureKind::infer(&name);
        Self { name, kind }
    }
}

/// Ordered column list the classifier expects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedFeatureSchema {
    descriptors: Vec<FeatureDescriptor>,
}

impl ExpectedFeatureSchema {
    #[must_use]
    pub fn new(descriptors: Vec<FeatureDescriptor>) -> Self {
        Self { descriptors }
    }

    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(FeatureDescriptor::inferred).collect())
    }

    /// Columns produced by the feature builder, in their natural order
    #[must_use]
    pub fn standard() -> Self {
        Self::from_names(columns::STANDARD)
    }

    #[must_use]
    pub fn descriptors(&self) -> &[FeatureDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn numeric_default(name: &str) -> f64 {
    match name {
        columns::TEMPERATURE => SIMULATED_TEMPERATURE,
        columns::HUMIDITY => f64::from(SIMULATED_HUMIDITY),
        columns::PRESSURE => f64::from(SIMULATED_PRESSURE),
        columns::VISIBILITY => f64::from(SIMULATED_VISIBILITY),
        columns::WIND_SPEED => SIMULATED_WIND_SPEED,
        _ => 0.0,
    }
}

fn categorical_default(name: &str, registry: &EncoderRegistry) -> FeatureValue {
    match registry
        .encoder_for_column(name)
        .and_then(|encoder| encoder.fallback_label().and_then(|l| encoder.index_of(l)))
    {
        Some(index) => FeatureValue::Numeric(index as f64),
        None => FeatureValue::from(SIMULATED_CONDITION),
    }
}

/// Reconcile an encoded feature map against `schema`.
///
/// The result carries exactly the schema's names, in schema order, all
/// numeric. Fails with `MissingRequiredFeature` for an absent required column
/// and `FeatureCoercion` for a value that cannot become a float.
#[instrument(skip_all, fields(columns = schema.len()))]
pub fn reconcile(
    mut built: FeatureMap,
    schema: &ExpectedFeatureSchema,
    registry: &EncoderRegistry,
) -> Result<FeatureVector> {
    let mut names = Vec::with_capacity(schema.len());
    let mut values = Vec::with_capacity(schema.len());

    for descriptor in schema.descriptors() {
        let name = descriptor.name.as_str();
        let value = match built.remove(name) {
            Some(value) => value,
            None => match descriptor.kind {
                FeatureKind::NumericDefaultable => {
                    let default = numeric_default(name);
                    debug!("Defaulting missing feature '{}' to {}", name, default);
                    FeatureValue::Numeric(default)
                }
                FeatureKind::CategoricalDefaultable => {
                    let default = categorical_default(name, registry);
                    debug!("Defaulting missing feature '{}' to {:?}", name, default);
                    default
                }
                FeatureKind::NumericRequired | FeatureKind::CategoricalRequired => {
                    return Err(FlightOnTimeError::missing_feature(name));
                }
            },
        };

        let numeric = value
            .as_f64()
            .ok_or_else(|| FlightOnTimeError::coercion(name, value.canonical()))?;
        names.push(descriptor.name.clone());
        values.push(numeric);
    }

    if !built.is_empty() {
        debug!(
            "Dropping {} features not in schema: {:?}",
            built.len(),
            built.keys().collect::<Vec<_>>()
        );
    }

    Ok(FeatureVector::from_parts(names, values))
}
