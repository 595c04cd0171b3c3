// Library exports for the malicious URL detector
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod handlers;
pub mod ml;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, ConfigError, Environment};
pub use models::{FeatureVector, Label, Prediction, TrainingExample, FEATURE_COUNT, FEATURE_NAMES};
pub use services::{
    Classification, ClassifierError, ClassifierService, ClassifierSettings, DetectorService,
    ExtractionError, FeatureLists, FeatureLog, UrlFeatureExtractor,
};
pub use utils::{DetectorError, DetectorResult};

// Re-export route builders
pub use handlers::{build_router, detector_routes};

/// Build the shared application state from configuration.
///
/// Must be called inside a Tokio runtime for the feature log to batch writes.
pub fn build_app_state(config: AppConfig) -> AppState {
    AppState::new(config)
}
