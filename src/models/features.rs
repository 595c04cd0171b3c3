// URL feature vector - the fixed-order contract between training and inference
// Field order below must never change without bumping ARTIFACT_FORMAT_VERSION

use serde::{Deserialize, Serialize};

// =============================================================================
// SCHEMA
// =============================================================================

/// Number of features in a [`FeatureVector`]
pub const FEATURE_COUNT: usize = 19;

/// Canonical feature names, in positional order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "url_length",
    "domain_length",
    "path_length",
    "query_length",
    "https",
    "http",
    "subdomain_count",
    "has_subdomain",
    "suspicious_tld",
    "path_depth",
    "has_file_extension",
    "query_count",
    "has_parameters",
    "suspicious_words",
    "digit_count",
    "special_char_count",
    "has_redirect",
    "has_shortener",
    "entropy",
];

/// Positional form of a feature vector, as consumed by the classifier
pub type FeatureArray = [f64; FEATURE_COUNT];

// =============================================================================
// FEATURE VECTOR
// =============================================================================

/// Numeric description of a single URL.
///
/// The struct is the only representation the extractor produces; the
/// positional array is derived from it by [`FeatureVector::to_array`], which
/// is the single place where field order is decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub url_length: usize,
    pub domain_length: usize,
    pub path_length: usize,
    pub query_length: usize,
    pub https: bool,
    pub http: bool,
    pub subdomain_count: usize,
    pub has_subdomain: bool,
    pub suspicious_tld: bool,
    pub path_depth: usize,
    pub has_file_extension: bool,
    pub query_count: usize,
    pub has_parameters: bool,
    pub suspicious_words: usize,
    pub digit_count: usize,
    pub special_char_count: usize,
    pub has_redirect: bool,
    pub has_shortener: bool,
    pub entropy: f64,
}

impl FeatureVector {
    /// Convert to the positional vector in canonical order
    pub fn to_array(&self) -> FeatureArray {
        [
            self.url_length as f64,
            self.domain_length as f64,
            self.path_length as f64,
            self.query_length as f64,
            indicator(self.https),
            indicator(self.http),
            self.subdomain_count as f64,
            indicator(self.has_subdomain),
            indicator(self.suspicious_tld),
            self.path_depth as f64,
            indicator(self.has_file_extension),
            self.query_count as f64,
            indicator(self.has_parameters),
            self.suspicious_words as f64,
            self.digit_count as f64,
            self.special_char_count as f64,
            indicator(self.has_redirect),
            indicator(self.has_shortener),
            self.entropy,
        ]
    }

    /// Feature names paired with their values, in canonical order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

// =============================================================================
// LABELS & TRAINING EXAMPLES
// =============================================================================

/// Binary classification target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Benign = 0,
    Malicious = 1,
}

impl Label {
    /// Class index used by the model (0 = benign, 1 = malicious)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Label::Benign),
            1 => Some(Label::Malicious),
            _ => None,
        }
    }

    pub fn is_malicious(self) -> bool {
        self == Label::Malicious
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Benign => write!(f, "benign"),
            Label::Malicious => write!(f, "malicious"),
        }
    }
}

/// A labelled feature vector. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    features: FeatureVector,
    label: Label,
}

impl TrainingExample {
    pub fn new(features: FeatureVector, label: Label) -> Self {
        Self { features, label }
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    pub fn label(&self) -> Label {
        self.label
    }
}
