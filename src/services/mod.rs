// Services module for the URL detector
// Feature extraction, model lifecycle and the feature log

pub mod classifier;
pub mod detector;
pub mod feature_extractor;
pub mod feature_log;
pub mod seed_data;

// Re-export commonly used services
pub use classifier::{
    ArtifactMetadata, ClassifierArtifact, ClassifierError, ClassifierResult, ClassifierService,
    ClassifierSettings, LifecycleState,
};
pub use detector::{Classification, DetectorService, InitializeOutcome, ModelStatus};
pub use feature_extractor::{ExtractionError, FeatureLists, UrlFeatureExtractor};
pub use feature_log::{FeatureLog, FeatureLogEntry, FeatureLogError, FeatureLogWriter};
pub use seed_data::seed_training_set;
