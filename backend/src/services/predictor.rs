//! Yield predictor backed by a trained random forest
//!
//! The model artifact is the flattened scikit-learn tree layout exported as
//! JSON. Each tree is a set of parallel arrays indexed by node id; a node is a
//! leaf when `children_left[node] == -1`, otherwise samples go left when
//! `x[feature[node]] <= threshold[node]`. The forest prediction is the mean of
//! the tree outputs.

use std::sync::Arc;

use serde::Deserialize;
use shared::{check_feature_order, FeatureOrderMismatch, FeatureVector, FEATURE_COUNT};
use thiserror::Error;

/// Errors raised while loading or evaluating the model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model has no trees")]
    Empty,

    #[error("unsupported model kind '{0}'")]
    UnsupportedKind(String),

    #[error("feature order mismatch: {0}")]
    FeatureOrder(#[from] FeatureOrderMismatch),

    #[error("tree {tree}: {message}")]
    MalformedTree { tree: usize, message: String },

    #[error("model produced a non-finite prediction")]
    NonFiniteOutput,
}

/// A trained regression model
pub trait RegressionModel: Send + Sync {
    /// Predict a single target value from one row of features
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Number of input features the model expects
    fn n_features(&self) -> usize;

    /// Number of fitted estimators, for diagnostics
    fn n_estimators(&self) -> usize {
        1
    }
}

/// One tree of the exported forest
#[derive(Debug, Clone, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

/// Raw shape of the model artifact (`model.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct ForestArtifact {
    pub kind: String,
    pub feature_names: Vec<String>,
    pub trees: Vec<TreeArrays>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn from_arrays(index: usize, arrays: TreeArrays, n_features: usize) -> Result<Self, ModelError> {
        let malformed = |message: String| ModelError::MalformedTree {
            tree: index,
            message,
        };

        let n = arrays.children_left.len();
        if n == 0 {
            return Err(malformed("no nodes".to_string()));
        }
        if [
            arrays.children_right.len(),
            arrays.feature.len(),
            arrays.threshold.len(),
            arrays.value.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err(malformed("node arrays differ in length".to_string()));
        }

        let child = |raw: i64, node: usize| -> Result<usize, ModelError> {
            usize::try_from(raw)
                .ok()
                .filter(|c| *c > node && *c < n)
                .ok_or_else(|| malformed(format!("node {} has invalid child {}", node, raw)))
        };

        let mut nodes = Vec::with_capacity(n);
        for node in 0..n {
            if arrays.children_left[node] == -1 {
                nodes.push(Node::Leaf(arrays.value[node]));
                continue;
            }
            let feature = usize::try_from(arrays.feature[node])
                .ok()
                .filter(|f| *f < n_features)
                .ok_or_else(|| {
                    malformed(format!(
                        "node {} splits on invalid feature {}",
                        node, arrays.feature[node]
                    ))
                })?;
            nodes.push(Node::Split {
                feature,
                threshold: arrays.threshold[node],
                left: child(arrays.children_left[node], node)?,
                right: child(arrays.children_right[node], node)?,
            });
        }

        Ok(Self { nodes })
    }

    /// Children always have larger ids than their parent, so the walk ends
    fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Random forest regressor evaluated natively
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
}

impl RandomForestRegressor {
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, ModelError> {
        if artifact.kind != "random_forest" {
            return Err(ModelError::UnsupportedKind(artifact.kind));
        }
        check_feature_order(artifact.feature_names.as_slice())?;
        if artifact.trees.is_empty() {
            return Err(ModelError::Empty);
        }

        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, arrays)| DecisionTree::from_arrays(i, arrays, FEATURE_COUNT))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees })
    }
}

impl RegressionModel for RandomForestRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(ModelError::Empty);
        }

        let sum: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

/// Wraps the loaded model and enforces the output contract
#[derive(Clone)]
pub struct YieldPredictor {
    model: Arc<dyn RegressionModel>,
}

impl YieldPredictor {
    pub fn new(model: Arc<dyn RegressionModel>) -> Self {
        Self { model }
    }

    /// Predicted total production for the feature vector.
    ///
    /// Never negative; non-finite model output is a [`ModelError`].
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let expected = self.model.n_features();
        if expected != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: FEATURE_COUNT,
            });
        }

        let raw = self.model.predict(features.as_slice())?;
        if !raw.is_finite() {
            return Err(ModelError::NonFiniteOutput);
        }
        Ok(raw.max(0.0))
    }

    pub fn n_estimators(&self) -> usize {
        self.model.n_estimators()
    }
}
