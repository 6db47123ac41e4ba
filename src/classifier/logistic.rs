//! Binary logistic regression

use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::features::FeatureVector;
use crate::{FlightOnTimeError, Result};

fn default_classes() -> [i64; 2] {
    [0, 1]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Labels for the negative and positive class
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    fn positive_probability(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.coefficients.len() {
            return Err(FlightOnTimeError::inference(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                x.len()
            )));
        }
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>();
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let p = self.positive_probability(features.values())?;
        Ok(vec![1.0 - p, p])
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let p = self.positive_probability(features.values())?;
        Ok(if p > 0.5 { self.classes[1] } else { self.classes[0] })
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn check_input_width(&self, n_features: usize) -> Result<()> {
        if self.coefficients.len() == n_features {
            Ok(())
        } else {
            Err(FlightOnTimeError::model_load(format!(
                "{} coefficients for {n_features} schema columns",
                self.coefficients.len()
            )))
        }
    }
}
