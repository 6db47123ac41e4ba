//! Random forest classifier
//!
//! Trees are stored as flat node arrays exported from the training pipeline.
//! A split sends a sample left when `x[feature] <= threshold`. Leaves hold
//! per-class counts (or fractions); the forest averages the normalised leaf
//! distributions of all trees.

use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::features::FeatureVector;
use crate::{FlightOnTimeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check node layout. Children always point forward, so evaluation
    /// terminates.
    fn validate(&self, tree_idx: usize, n_classes: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(FlightOnTimeError::model_load(format!(
                "tree {tree_idx} has no nodes"
            )));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { left, right, .. } => {
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(FlightOnTimeError::model_load(format!(
                                "tree {tree_idx} node {idx} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(FlightOnTimeError::model_load(format!(
                            "tree {tree_idx} leaf {idx} has {} values for {n_classes} classes",
                            value.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    fn leaf_for(&self, x: &[f64]) -> Result<&[f64]> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return Ok(value.as_slice()),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).ok_or_else(|| {
                        FlightOnTimeError::inference(format!(
                            "split on feature {feature} but vector has {} columns",
                            x.len()
                        ))
                    })?;
                    idx = if value <= threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Ensemble of decision trees voting by mean leaf distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Class label for each probability column
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl RandomForest {
    /// Validate the forest layout before use
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(FlightOnTimeError::model_load("forest has no classes"));
        }
        if self.trees.is_empty() {
            return Err(FlightOnTimeError::model_load("forest has no trees"));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.classes.len())?;
        }
        Ok(())
    }
}

fn normalise(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    if total > 0.0 {
        counts.iter().map(|c| c / total).collect()
    } else {
        vec![1.0 / counts.len() as f64; counts.len()]
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let x = features.values();
        let mut mean = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in mean.iter_mut().zip(normalise(tree.leaf_for(x)?)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(mean.into_iter().map(|p| p / n_trees).collect())
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let probabilities = self.predict_proba(features)?;
        let best = probabilities
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, &p)| match best {
                Some((_, best_p)) if best_p >= p => best,
                _ => Some((idx, p)),
            })
            .map(|(idx, _)| idx)
            .ok_or_else(|| FlightOnTimeError::inference("forest produced no probabilities"))?;
        Ok(self.classes[best])
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn check_input_width(&self, n_features: usize) -> Result<()> {
        match self.trees.iter().filter_map(DecisionTree::max_feature).max() {
            Some(max) if max >= n_features => Err(FlightOnTimeError::model_load(format!(
                "forest splits on feature {max} but schema has {n_features} columns"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    value: left.to_vec(),
                },
                TreeNode::Leaf {
                    value: right.to_vec(),
                },
            ],
        }
    }

    fn vector(values: &[f64]) -> FeatureVector {
        FeatureVector::from_parts(
            (0..values.len()).map(|i| format!("f{i}")).collect(),
            values.to_vec(),
        )
    }

    fn forest() -> RandomForest {
        RandomForest {
            classes: vec![0, 1],
            trees: vec![
                stump(0, 1000.0, [90.0, 10.0], [30.0, 70.0]),
                stump(1, 0.5, [8.0, 2.0], [2.0, 8.0]),
            ],
            feature_names: None,
        }
    }

    #[test]
    fn test_mean_of_normalised_leaves() {
        let forest = forest();
        forest.validate().unwrap();

        let p = forest.predict_proba(&vector(&[500.0, 0.0])).unwrap();
        assert!((p[0] - 0.85).abs() < 1e-12);
        assert!((p[1] - 0.15).abs() < 1e-12);
        assert_eq!(forest.predict(&vector(&[500.0, 0.0])).unwrap(), 0);

        let p = forest.predict_proba(&vector(&[2500.0, 1.0])).unwrap();
        assert!((p[1] - 0.75).abs() < 1e-12);
        assert_eq!(forest.predict(&vector(&[2500.0, 1.0])).unwrap(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive_on_the_left() {
        let forest = RandomForest {
            classes: vec![0, 1],
            trees: vec![stump(0, 1.0, [1.0, 0.0], [0.0, 1.0])],
            feature_names: None,
        };
        assert_eq!(forest.predict(&vector(&[1.0])).unwrap(), 0);
        assert_eq!(forest.predict(&vector(&[1.0001])).unwrap(), 1);
    }

    #[test]
    fn test_short_vector_is_inference_error() {
        let err = forest().predict_proba(&vector(&[1.0])).unwrap_err();
        assert!(matches!(err, FlightOnTimeError::Inference { .. }));
    }

    #[test]
    fn test_backward_child_is_rejected() {
        let forest = RandomForest {
            classes: vec![0, 1],
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 0.0,
                        left: 0,
                        right: 1,
                    },
                    TreeNode::Leaf {
                        value: vec![1.0, 0.0],
                    },
                ],
            }],
            feature_names: None,
        };
        assert!(matches!(
            forest.validate().unwrap_err(),
            FlightOnTimeError::ModelLoad { .. }
        ));
    }

    #[test]
    fn test_input_width_check() {
        let forest = forest();
        assert!(forest.check_input_width(2).is_ok());
        assert!(forest.check_input_width(1).is_err());
    }

    #[test]
    fn test_nodes_deserialize_untagged() {
        let tree: DecisionTree = serde_json::from_str(
            r#"{"nodes": [
                {"feature": 3, "threshold": 1.5, "left": 1, "right": 2},
                {"value": [4, 1]},
                {"value": [0.2, 0.8]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tree.nodes.len(), 3);
        assert!(matches!(tree.nodes[0], TreeNode::Split { feature: 3, .. }));
        assert_eq!(tree.max_feature(), Some(3));
    }
}
