pub mod detection;
pub mod features;
pub mod prediction;

// Re-export common types
pub use detection::{DetectRequest, HealthResponse, StartupResponse, TrainResponse};
pub use features::{
    FeatureArray, FeatureVector, Label, TrainingExample, FEATURE_COUNT, FEATURE_NAMES,
};
pub use prediction::Prediction;
