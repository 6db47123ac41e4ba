//! Model artifact loading
//!
//! One JSON document carries everything the prediction path needs from
//! training:
//!
//! ```json
//! {
//!   "features": ["MONTH", {"name": "DISTANCE", "kind": "numeric-required"}],
//!   "encoders": {"OP_UNIQUE_CARRIER": ["AA", "DL"], "ORIGIN": ["ATL", "LAX"]},
//!   "aliases": {"ORIGIN": "ORIGIN_AIRPORT_ID"},
//!   "model": {"type": "random_forest", "classes": [0, 1], "trees": []}
//! }
//! ```
//!
//! `features` and `aliases` are optional. Without `features` the schema comes
//! from the classifier's own feature names, and failing that from the standard
//! builder columns. Artifact aliases extend and override the default table.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{Classifier, DelayModel, LogisticRegression, RandomForest};
use crate::features::{
    CategoricalEncoder, EncoderRegistry, ExpectedFeatureSchema, FeatureDescriptor,
};
use crate::{FlightOnTimeError, Result};

/// Schema entry: a bare name (kind inferred) or an explicit descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureEntry {
    Name(String),
    Descriptor(FeatureDescriptor),
}

impl From<FeatureEntry> for FeatureDescriptor {
    fn from(entry: FeatureEntry) -> Self {
        match entry {
            FeatureEntry::Name(name) => FeatureDescriptor::inferred(name),
            FeatureEntry::Descriptor(descriptor) => descriptor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ModelSpec {
    fn into_classifier(self) -> Result<Box<dyn Classifier>> {
        match self {
            Self::RandomForest(forest) => {
                forest.validate()?;
                Ok(Box::new(forest))
            }
            Self::LogisticRegression(model) => Ok(Box::new(model)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub features: Option<Vec<FeatureEntry>>,
    #[serde(default)]
    pub encoders: BTreeMap<String, CategoricalEncoder>,
    #[serde(default)]
    pub aliases: Option<HashMap<String, String>>,
    pub model: ModelSpec,
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FlightOnTimeError::model_load(format!("invalid model artifact: {e}")))
    }

    /// Build the immutable model bundle
    pub fn into_model(self) -> Result<DelayModel> {
        let classifier = self.model.into_classifier()?;

        let schema = match self.features {
            Some(entries) => {
                ExpectedFeatureSchema::new(entries.into_iter().map(Into::into).collect())
            }
            None => match classifier.feature_names() {
                Some(names) => ExpectedFeatureSchema::from_names(names.iter().cloned()),
                None => ExpectedFeatureSchema::standard(),
            },
        };

        for (key, encoder) in &self.encoders {
            if encoder.is_empty() {
                return Err(FlightOnTimeError::model_load(format!(
                    "encoder '{key}' has no labels"
                )));
            }
        }

        let mut aliases = EncoderRegistry::default_aliases();
        aliases.extend(self.aliases.unwrap_or_default());
        let encoders = EncoderRegistry::new(self.encoders, aliases);

        DelayModel::new(classifier, schema, encoders)
    }
}

/// Load the model artifact at `path`
#[instrument]
pub fn load_model(path: &Path) -> anyhow::Result<DelayModel> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
    let model = ModelArtifact::from_json(&json)
        .and_then(ModelArtifact::into_model)
        .with_context(|| format!("Failed to load model artifact {}", path.display()))?;

    info!(
        "Model loaded: {} with {} features, encoders for {:?}",
        model.name(),
        model.schema().len(),
        model.encoders().keys()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureKind;

    const FOREST: &str = r#"{
        "features": ["OP_UNIQUE_CARRIER", {"name": "DISTANCE", "kind": "numeric-required"}],
        "encoders": {"OP_UNIQUE_CARRIER": ["AA", "DL", "UA"], "ORIGIN": ["ATL", "LAX"]},
        "model": {
            "type": "random_forest",
            "classes": [0, 1],
            "trees": [{"nodes": [
                {"feature": 1, "threshold": 1500.0, "left": 1, "right": 2},
                {"value": [0.8, 0.2]},
                {"value": [0.3, 0.7]}
            ]}]
        }
    }"#;

    #[test]
    fn test_forest_artifact() {
        let model = ModelArtifact::from_json(FOREST).unwrap().into_model().unwrap();
        assert_eq!(model.name(), "random_forest");
        assert_eq!(model.schema().names(), ["OP_UNIQUE_CARRIER", "DISTANCE"]);
        assert_eq!(
            model.schema().kind_of("DISTANCE"),
            Some(FeatureKind::NumericRequired)
        );
        assert!(
            model
                .encoders()
                .encoder_for_column("ORIGIN_AIRPORT_ID")
                .is_some()
        );
    }

    #[test]
    fn test_schema_from_classifier_feature_names() {
        let json = r#"{
            "model": {
                "type": "logistic_regression",
                "coefficients": [0.1, 0.2],
                "intercept": 0.0,
                "feature_names": ["MONTH", "DISTANCE"]
            }
        }"#;
        let model = ModelArtifact::from_json(json).unwrap().into_model().unwrap();
        assert_eq!(model.schema().names(), ["MONTH", "DISTANCE"]);
    }

    #[test]
    fn test_schema_falls_back_to_standard_columns() {
        let json = r#"{
            "model": {"type": "logistic_regression", "coefficients": [], "intercept": 0.0}
        }"#;
        // standard schema has 16 columns, 0 coefficients do not fit
        let err = ModelArtifact::from_json(json).unwrap().into_model().unwrap_err();
        assert!(matches!(err, FlightOnTimeError::ModelLoad { .. }));
    }

    #[test]
    fn test_artifact_aliases_override_defaults() {
        let json = r#"{
            "features": ["ORIGIN_AIRPORT_ID"],
            "encoders": {"ORIGIN_IATA": ["ATL"]},
            "aliases": {"ORIGIN_IATA": "ORIGIN_AIRPORT_ID"},
            "model": {"type": "logistic_regression", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        let model = ModelArtifact::from_json(json).unwrap().into_model().unwrap();
        assert_eq!(
            model.encoders().column_for("ORIGIN_IATA"),
            "ORIGIN_AIRPORT_ID"
        );
        assert_eq!(model.encoders().column_for("DEST"), "DEST_AIRPORT_ID");
    }

    #[test]
    fn test_unknown_model_type() {
        let err = ModelArtifact::from_json(r#"{"model": {"type": "svm"}}"#).unwrap_err();
        assert!(matches!(err, FlightOnTimeError::ModelLoad { .. }));
    }

    #[test]
    fn test_empty_encoder_is_rejected() {
        let json = r#"{
            "features": ["DISTANCE"],
            "encoders": {"OP_UNIQUE_CARRIER": []},
            "model": {"type": "logistic_regression", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        let err = ModelArtifact::from_json(json).unwrap().into_model().unwrap_err();
        assert!(matches!(err, FlightOnTimeError::ModelLoad { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_model(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read model artifact"));
    }

    #[test]
    fn test_bundled_sample_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts/delay_model.json");
        let model = load_model(&path).unwrap();
        assert_eq!(model.schema().len(), 16);
    }
}
