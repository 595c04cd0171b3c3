//! Random forest: bagged decision trees with per-split feature subsampling.
//!
//! Each tree is grown on a bootstrap sample drawn from a single seeded
//! `StdRng`, so fitting the same data with the same [`ForestParams`] always
//! produces the same forest. Class probabilities are the mean of the per-tree
//! leaf frequencies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{DecisionTree, TreeParams};
use super::{MlError, MlResult, N_CLASSES};
use crate::models::{FeatureArray, Label, FEATURE_COUNT};

/// Forest hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered per split (`None` = floor(sqrt(feature count)))
    pub max_features: Option<usize>,
    /// Draw each tree's training rows with replacement
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        let sqrt_features = (FEATURE_COUNT as f64).sqrt().floor() as usize;
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self
                .max_features
                .unwrap_or(sqrt_features)
                .clamp(1, FEATURE_COUNT),
        }
    }

    fn validate(&self) -> MlResult<()> {
        if self.n_estimators == 0 {
            return Err(MlError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(MlError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Create an unfitted forest
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// True when the forest is fitted and every tree is structurally sound
    pub fn is_well_formed(&self) -> bool {
        self.is_fitted() && self.trees.iter().all(DecisionTree::is_well_formed)
    }

    /// Fit the forest, replacing any previously grown trees
    pub fn fit(&mut self, samples: &[FeatureArray], labels: &[Label]) -> MlResult<()> {
        if samples.len() != labels.len() {
            return Err(MlError::LengthMismatch {
                samples: samples.len(),
                labels: labels.len(),
            });
        }
        if samples.is_empty() {
            return Err(MlError::EmptyTrainingSet);
        }
        self.params.validate()?;

        let n = samples.len();
        let tree_params = self.params.tree_params();
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let trees = (0..self.params.n_estimators)
            .map(|_| {
                let indices: Vec<usize> = if self.params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(samples, labels, &indices, tree_params, &mut rng)
            })
            .collect::<Vec<_>>();

        debug!(
            "Fitted random forest: {} trees on {} samples (max depth {})",
            trees.len(),
            n,
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        self.trees = trees;
        Ok(())
    }

    /// Mean class probabilities over all trees
    pub fn predict_proba(&self, sample: &FeatureArray) -> MlResult<[f64; N_CLASSES]> {
        if self.trees.is_empty() {
            return Err(MlError::NotFitted);
        }

        let mut sums = [0.0f64; N_CLASSES];
        for tree in &self.trees {
            let proba = tree.predict_proba(sample);
            for (sum, p) in sums.iter_mut().zip(proba) {
                *sum += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(sums.map(|sum| sum / n_trees))
    }

    /// Most probable label (ties resolve to benign)
    pub fn predict(&self, sample: &FeatureArray) -> MlResult<Label> {
        let proba = self.predict_proba(sample)?;
        Ok(if proba[Label::Malicious.index()] > proba[Label::Benign.index()] {
            Label::Malicious
        } else {
            Label::Benign
        })
    }
}
