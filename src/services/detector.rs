// Detector facade: the operations exposed to the HTTP layer
// initialize, classify, retrain and status over extractor + classifier + feature log

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::app_config::AppConfig;
use crate::models::FeatureVector;
use crate::services::classifier::{ClassifierService, LifecycleState};
use crate::services::feature_extractor::{FeatureLists, UrlFeatureExtractor};
use crate::services::feature_log::{FeatureLog, FeatureLogEntry};
use crate::services::seed_data::seed_training_set;
use crate::utils::detector_errors::DetectorResult;

// =============================================================================
// RESULT TYPES
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub url: String,
    pub is_malicious: bool,
    pub confidence: f64,
    pub features: FeatureVector,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeOutcome {
    pub model_loaded: bool,
    /// A model was fitted by this call
    pub trained_now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_trained: bool,
    pub state: LifecycleState,
    pub model_path: String,
    pub features_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

// =============================================================================
// DETECTOR SERVICE
// =============================================================================

pub struct DetectorService {
    extractor: UrlFeatureExtractor,
    classifier: ClassifierService,
    feature_log: FeatureLog,
    retrain_on_startup: bool,
    initialized: Mutex<bool>,
}

impl DetectorService {
    pub fn new(
        extractor: UrlFeatureExtractor,
        classifier: ClassifierService,
        feature_log: FeatureLog,
        retrain_on_startup: bool,
    ) -> Self {
        Self {
            extractor,
            classifier,
            feature_log,
            retrain_on_startup,
            initialized: Mutex::new(false),
        }
    }

    /// Wire up the extractor, classifier and feature log from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let lists = if config.feature_lists_path.exists() {
            FeatureLists::load(&config.feature_lists_path)
        } else {
            debug!(
                "No feature lists at {}, using built-in lists",
                config.feature_lists_path.display()
            );
            FeatureLists::default()
        };

        Self::new(
            UrlFeatureExtractor::new(lists, config.max_url_length),
            ClassifierService::new(&config.model_path, config.classifier_settings()),
            FeatureLog::new(&config.features_path),
            config.retrain_on_startup,
        )
    }

    pub fn extractor(&self) -> &UrlFeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &ClassifierService {
        &self.classifier
    }

    pub fn feature_log(&self) -> &FeatureLog {
        &self.feature_log
    }

    /// Make sure a trained classifier is available.
    ///
    /// The first call discards the persisted model when retraining on
    /// startup. Every call loads the persisted model if nothing is trained,
    /// and trains on the seed set if nothing usable was loaded.
    pub fn initialize(&self) -> DetectorResult<InitializeOutcome> {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !*initialized && self.retrain_on_startup {
            info!("Retraining model on startup");
            self.classifier.reset()?;
        }

        if !self.classifier.is_trained() {
            self.classifier.load_or_create();
        }

        let outcome = if self.classifier.is_trained() {
            InitializeOutcome {
                model_loaded: true,
                trained_now: false,
                accuracy: self.classifier.artifact_metadata().map(|m| m.accuracy),
            }
        } else {
            info!("Training new model");
            let accuracy = self.classifier.train_with_seed_data(&self.extractor)?;
            InitializeOutcome {
                model_loaded: true,
                trained_now: true,
                accuracy: Some(accuracy),
            }
        };

        if !*initialized {
            *initialized = true;
            info!("Model initialization complete");
        }
        Ok(outcome)
    }

    /// Classify one URL and record it in the feature log
    pub fn classify(&self, url: &str) -> DetectorResult<Classification> {
        let features = self.extractor.extract(url)?;

        if !self.classifier.is_loaded() {
            self.classifier.load_or_create();
        }
        let prediction = self.classifier.predict(&features)?;

        let entry = FeatureLogEntry::new(url.trim(), features, prediction.label);
        let classification = Classification {
            url: entry.url.clone(),
            is_malicious: prediction.is_malicious(),
            confidence: prediction.confidence,
            features: entry.features.clone(),
            timestamp: entry.timestamp,
        };
        self.feature_log.append(entry);

        debug!(
            "Classified {} as {} ({:.2})",
            classification.url, prediction.label, classification.confidence
        );
        Ok(classification)
    }

    /// Retrain on the seed set.
    ///
    /// Without `force` the persisted artifact is deleted and the current
    /// instance is refit. With `force` the in-memory model is discarded as
    /// well and a fresh one is trained.
    pub fn retrain(&self, force: bool) -> DetectorResult<f64> {
        let accuracy = if force {
            info!("Force retraining model");
            self.classifier
                .force_retrain(&seed_training_set(&self.extractor))?
        } else {
            self.classifier
                .retrain_in_place(&seed_training_set(&self.extractor))?
        };
        Ok(accuracy)
    }

    pub fn status(&self) -> ModelStatus {
        let metadata = self.classifier.artifact_metadata();
        ModelStatus {
            model_loaded: self.classifier.is_loaded(),
            model_trained: metadata.is_some(),
            state: self.classifier.lifecycle_state(),
            model_path: self.classifier.model_path().display().to_string(),
            features_path: self.feature_log.path().display().to_string(),
            trained_at: metadata.as_ref().map(|m| m.trained_at),
            accuracy: metadata.as_ref().map(|m| m.accuracy),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classifier::ClassifierSettings;
    use crate::utils::detector_errors::DetectorError;
    use tempfile::TempDir;

    fn detector(dir: &TempDir, retrain_on_startup: bool) -> DetectorService {
        let settings = ClassifierSettings {
            n_estimators: 10,
            ..ClassifierSettings::default()
        };
        DetectorService::new(
            UrlFeatureExtractor::default(),
            ClassifierService::new(dir.path().join("model.json"), settings),
            FeatureLog::synchronous(dir.path().join("features.csv")),
            retrain_on_startup,
        )
    }

    #[test]
    fn test_initialize_trains_once() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);

        let first = detector.initialize().unwrap();
        assert!(first.trained_now);
        assert!(first.model_loaded);

        let second = detector.initialize().unwrap();
        assert!(!second.trained_now);
        assert_eq!(second.accuracy, first.accuracy);
    }

    #[test]
    fn test_initialize_reuses_persisted_model() {
        let dir = tempfile::tempdir().unwrap();
        detector(&dir, false).initialize().unwrap();

        let outcome = detector(&dir, false).initialize().unwrap();
        assert!(!outcome.trained_now);

        let outcome = detector(&dir, true).initialize().unwrap();
        assert!(outcome.trained_now);
    }

    #[test]
    fn test_classify_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);

        assert!(matches!(
            detector.classify("https://example.com"),
            Err(DetectorError::ModelNotTrained)
        ));
        assert!(!dir.path().join("features.csv").exists());
    }

    #[test]
    fn test_classify_logs_features() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);
        detector.initialize().unwrap();

        let result = detector.classify("  https://www.google.com ").unwrap();
        assert_eq!(result.url, "https://www.google.com");
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.features.https);

        let mut reader = csv::Reader::from_path(dir.path().join("features.csv")).unwrap();
        assert_eq!(reader.records().count(), 1);
    }

    #[test]
    fn test_classify_rejects_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);
        detector.initialize().unwrap();

        assert!(matches!(
            detector.classify("not a url"),
            Err(DetectorError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_retrain_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);

        let status = detector.status();
        assert!(!status.model_loaded);
        assert!(!status.model_trained);

        let accuracy = detector.retrain(false).unwrap();
        let forced = detector.retrain(true).unwrap();
        assert_eq!(accuracy, forced);

        let status = detector.status();
        assert!(status.model_trained);
        assert_eq!(status.state, LifecycleState::Trained);
        assert_eq!(status.accuracy, Some(forced));
        assert!(status.model_path.ends_with("model.json"));
    }

    #[test]
    fn test_initialize_recovers_after_failed_retrain() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);
        detector.initialize().unwrap();

        // A directory in place of the temp file makes the save fail
        let blocker = dir.path().join("model.json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        assert!(matches!(
            detector.retrain(true),
            Err(DetectorError::ArtifactIo(_))
        ));
        assert!(!detector.classifier().is_trained());
        std::fs::remove_dir(&blocker).unwrap();

        let outcome = detector.initialize().unwrap();
        assert!(outcome.trained_now);
        assert!(detector.classifier().is_trained());
        assert!(detector.classify("https://www.google.com").is_ok());
    }

    #[test]
    fn test_startup_reset_happens_once() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, true);

        let first = detector.initialize().unwrap();
        assert!(first.trained_now);
        let trained_at = detector.status().trained_at;

        let second = detector.initialize().unwrap();
        assert!(!second.trained_now);
        assert_eq!(detector.status().trained_at, trained_at);
    }

    #[test]
    fn test_plain_retrain_keeps_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let detector = detector(&dir, false);
        detector.initialize().unwrap();

        detector.retrain(false).unwrap();

        assert!(dir.path().join("model.json").exists());
        assert_eq!(detector.status().state, LifecycleState::Trained);
    }
}
