// Classifier output types

use serde::{Deserialize, Serialize};

use super::features::Label;

/// Result of running the classifier on one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Probability of the winning label, in [0, 1]
    pub confidence: f64,
    /// Per-class probabilities indexed by [`Label::index`]
    pub probabilities: [f64; 2],
}

impl Prediction {
    /// Build a prediction from class probabilities. Ties go to benign.
    pub fn from_probabilities(probabilities: [f64; 2]) -> Self {
        let label = if probabilities[Label::Malicious.index()]
            > probabilities[Label::Benign.index()]
        {
            Label::Malicious
        } else {
            Label::Benign
        };

        Self {
            label,
            confidence: probabilities[label.index()].clamp(0.0, 1.0),
            probabilities,
        }
    }

    pub fn is_malicious(&self) -> bool {
        self.label.is_malicious()
    }
}
