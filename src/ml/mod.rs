//! Tree-ensemble classifier used to score URLs.
//!
//! The model is a random forest of Gini decision trees operating on
//! [`FeatureArray`](crate::models::FeatureArray) samples. Everything here is
//! synchronous, deterministic for a given seed, and serde-serializable so a
//! fitted forest can be persisted as part of a classifier artifact.

pub mod dataset;
pub mod forest;
pub mod tree;

use thiserror::Error;

pub use dataset::{accuracy, train_test_split, DatasetSplit};
pub use forest::{ForestParams, RandomForest};
pub use tree::{DecisionTree, TreeParams};

/// Number of classes the models distinguish (benign, malicious)
pub const N_CLASSES: usize = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MlError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Sample/label length mismatch: {samples} samples, {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type MlResult<T> = Result<T, MlError>;
