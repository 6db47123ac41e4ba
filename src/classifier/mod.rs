//! Delay classifier capability and output validation
//!
//! A [`DelayModel`] bundles the classifier with the encoders and schema it was
//! trained with. All three are fixed when the artifact is loaded and shared
//! read-only for the lifetime of the process.

pub mod artifact;
pub mod forest;
pub mod logistic;

use tracing::{debug, warn};

use crate::features::{
    EncoderRegistry, ExpectedFeatureSchema, FeatureMap, FeatureVector, encode_features, reconcile,
};
use crate::models::PredictionResult;
use crate::models::prediction::round4;
use crate::{FlightOnTimeError, Result};

pub use artifact::{ModelArtifact, ModelSpec, load_model};
pub use forest::{DecisionTree, RandomForest, TreeNode};
pub use logistic::LogisticRegression;

/// Tolerance on the sum of the two class probabilities before warning
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.01;

/// Binary delay classifier over a reconciled feature vector
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Class probabilities `[p(on time), p(delayed)]`
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>>;

    /// Predicted class label
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Column names recorded by the classifier itself, if any
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Check the classifier can consume vectors of `n_features` columns
    fn check_input_width(&self, _n_features: usize) -> Result<()> {
        Ok(())
    }
}

/// Validate raw classifier output and derive the response values.
///
/// Probabilities must be exactly two finite values in `[0, 1]` and the label
/// must be 0 or 1. A sum away from 1 is only logged.
pub fn validate_output(probabilities: &[f64], label: i64) -> Result<PredictionResult> {
    let [p_on_time, p_delayed] = probabilities else {
        return Err(FlightOnTimeError::invalid_output(format!(
            "expected 2 class probabilities, got {}",
            probabilities.len()
        )));
    };

    for p in [p_on_time, p_delayed] {
        if p.is_nan() {
            return Err(FlightOnTimeError::invalid_output("probability is NaN"));
        }
        if !(0.0..=1.0).contains(p) {
            return Err(FlightOnTimeError::invalid_output(format!(
                "probability {p} outside [0, 1]"
            )));
        }
    }

    let sum = p_on_time + p_delayed;
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        warn!("Class probabilities sum to {:.4}, expected 1.0", sum);
    }

    let label = match label {
        0 => 0,
        1 => 1,
        other => {
            return Err(FlightOnTimeError::invalid_output(format!(
                "unexpected class label {other}"
            )));
        }
    };

    Ok(PredictionResult {
        label,
        delay_probability: round4(*p_delayed),
        confidence: round4(p_on_time.max(*p_delayed)),
    })
}

/// Classifier together with the encoders and schema it was trained with
pub struct DelayModel {
    classifier: Box<dyn Classifier>,
    schema: ExpectedFeatureSchema,
    encoders: EncoderRegistry,
}

impl std::fmt::Debug for DelayModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayModel")
            .field("classifier", &self.classifier.name())
            .field("features", &self.schema.len())
            .field("encoders", &self.encoders.keys())
            .finish()
    }
}

impl DelayModel {
    /// Bundle a classifier with its schema and encoders.
    ///
    /// Fails with `ModelLoad` when the schema is empty or its width does not
    /// fit the classifier.
    pub fn new(
        classifier: Box<dyn Classifier>,
        schema: ExpectedFeatureSchema,
        encoders: EncoderRegistry,
    ) -> Result<Self> {
        if schema.is_empty() {
            return Err(FlightOnTimeError::model_load("feature schema is empty"));
        }
        classifier.check_input_width(schema.len())?;

        Ok(Self {
            classifier,
            schema,
            encoders,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.classifier.name()
    }

    #[must_use]
    pub fn schema(&self) -> &ExpectedFeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    /// Encode and reconcile raw features into the classifier's input
    pub fn vectorize(&self, raw: FeatureMap) -> Result<FeatureVector> {
        let encoded = encode_features(raw, &self.schema, &self.encoders)?;
        reconcile(encoded, &self.schema, &self.encoders)
    }

    /// Run the classifier and validate what it returns
    pub fn classify(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let probabilities = self.classifier.predict_proba(features)?;
        let label = self.classifier.predict(features)?;
        debug!(
            "{} returned probabilities {:?} and label {}",
            self.classifier.name(),
            probabilities,
            label
        );
        validate_output(&probabilities, label)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted classifiers for tests

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Returns fixed output and counts how often it was asked
    pub struct FixedClassifier {
        pub probabilities: Vec<f64>,
        pub label: i64,
        pub calls: Arc<AtomicUsize>,
    }

    impl FixedClassifier {
        pub fn new(probabilities: Vec<f64>, label: i64) -> Self {
            Self {
                probabilities,
                label,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probabilities.clone())
        }

        fn predict(&self, _features: &FeatureVector) -> Result<i64> {
            Ok(self.label)
        }
    }
}
