//! Categorical encoding resolution
//!
//! Each encoder is an ordered label list learned at training time; a label's
//! position is the value the classifier saw. Labels never seen during training
//! map to position 0. Whether position 0 is the most frequent training label is
//! not recorded anywhere, so treat that fallback as a heuristic.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ExpectedFeatureSchema, FeatureKind, FeatureMap, FeatureValue, columns};
use crate::{FlightOnTimeError, Result};

/// Ordered list of known labels for one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoricalEncoder {
    labels: Vec<String>,
}

impl CategoricalEncoder {
    #[must_use]
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|known| known == label)
    }

    /// Label substituted for unknown values
    #[must_use]
    pub fn fallback_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Outcome of resolving one categorical value
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Label known to the encoder
    Resolved(usize),
    /// Label unknown; first known label substituted
    Fallback(usize),
    /// No encoder for this feature; value passed through untouched
    Unencoded(FeatureValue),
    /// Encoder exists but has no labels to fall back on
    Unresolvable,
}

/// Resolve a raw value against the encoder for `feature_name`.
///
/// Never fails for unknown labels; see [`Resolution`].
#[must_use]
pub fn resolve(
    feature_name: &str,
    raw_value: &FeatureValue,
    encoder: Option<&CategoricalEncoder>,
) -> Resolution {
    let Some(encoder) = encoder else {
        return Resolution::Unencoded(raw_value.clone());
    };

    let label = raw_value.canonical();
    if let Some(index) = encoder.index_of(&label) {
        return Resolution::Resolved(index);
    }

    match encoder.fallback_label() {
        Some(fallback) => {
            debug!(
                "Unknown label '{}' for '{}', falling back to '{}' (index 0)",
                label, feature_name, fallback
            );
            Resolution::Fallback(0)
        }
        None => Resolution::Unresolvable,
    }
}

/// Encoders keyed by training name plus the alias table to schema columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, CategoricalEncoder>,
    aliases: HashMap<String, String>,
}

impl EncoderRegistry {
    /// Build a registry with an explicit `{encoder_key -> column}` alias table
    #[must_use]
    pub fn new(
        encoders: BTreeMap<String, CategoricalEncoder>,
        aliases: HashMap<String, String>,
    ) -> Self {
        Self { encoders, aliases }
    }

    /// Aliases the training pipeline is known to use
    #[must_use]
    pub fn default_aliases() -> HashMap<String, String> {
        HashMap::from([
            ("ORIGIN".to_string(), columns::ORIGIN.to_string()),
            ("DEST".to_string(), columns::DESTINATION.to_string()),
        ])
    }

    /// Column an encoder applies to
    #[must_use]
    pub fn column_for<'a>(&'a self, encoder_key: &'a str) -> &'a str {
        self.aliases
            .get(encoder_key)
            .map_or(encoder_key, String::as_str)
    }

    /// Encoder applying to a schema column, through aliases first
    #[must_use]
    pub fn encoder_for_column(&self, column: &str) -> Option<&CategoricalEncoder> {
        self.encoders
            .iter()
            .find(|(key, _)| self.aliases.get(*key).is_some_and(|c| c == column))
            .map(|(_, encoder)| encoder)
            .or_else(|| self.encoders.get(column))
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.encoders.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

/// Replace categorical values with encoder indices.
///
/// Numeric values are left alone. Values without an encoder pass through and
/// are judged by the reconciler's numeric coercion. An unresolvable value in a
/// `categorical-required` column fails with `MissingRequiredFeature`.
pub fn encode_features(
    raw: FeatureMap,
    schema: &ExpectedFeatureSchema,
    registry: &EncoderRegistry,
) -> Result<FeatureMap> {
    let mut encoded = FeatureMap::new();

    for (name, value) in raw {
        let encoder = registry.encoder_for_column(&name);
        if encoder.is_none() && matches!(value, FeatureValue::Numeric(_)) {
            encoded.insert(name, value);
            continue;
        }

        let value = match resolve(&name, &value, encoder) {
            Resolution::Resolved(index) => FeatureValue::Numeric(index as f64),
            Resolution::Fallback(index) => {
                warn!(
                    "Value '{}' for '{}' not seen in training, using fallback index {}",
                    value.canonical(),
                    name,
                    index
                );
                FeatureValue::Numeric(index as f64)
            }
            Resolution::Unencoded(value) => value,
            Resolution::Unresolvable => {
                if schema.kind_of(&name) == Some(FeatureKind::CategoricalRequired) {
                    return Err(FlightOnTimeError::missing_feature(name));
                }
                debug!("No resolution path for '{}', leaving raw value", name);
                value
            }
        };
        encoded.insert(name, value);
    }

    Ok(encoded)
}
