// Classifier lifecycle management
// Owns the single current model: load, create, train, predict, persist, force-retrain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ml::{accuracy, train_test_split, ForestParams, MlError, RandomForest};
use crate::models::{
    FeatureArray, FeatureVector, Label, Prediction, TrainingExample, FEATURE_COUNT, FEATURE_NAMES,
};
use crate::services::feature_extractor::UrlFeatureExtractor;
use crate::services::seed_data::seed_training_set;

/// Bumped whenever the feature schema or the serialized model layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    #[error("Artifact I/O error at {path}: {message}")]
    ArtifactIo { path: String, message: String },

    #[error("Incompatible model artifact: {0}")]
    IncompatibleArtifact(String),

    #[error("Training failed: {0}")]
    Training(#[from] MlError),
}

impl ClassifierError {
    fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        ClassifierError::ArtifactIo {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

// =============================================================================
// SETTINGS
// =============================================================================

/// Training knobs, mirrored from the application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Held-out fraction, in (0, 1)
    pub test_size: f64,
    /// Seed for both the split and the forest
    pub random_state: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl ClassifierSettings {
    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.random_state,
            ..ForestParams::default()
        }
    }
}

// =============================================================================
// ARTIFACT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub random_state: u64,
    pub trained_at: DateTime<Utc>,
    pub training_examples: usize,
    pub held_out_examples: usize,
    pub accuracy: f64,
}

/// A fitted model plus the metadata needed to trust it after a reload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub metadata: ArtifactMetadata,
    forest: RandomForest,
}

impl ClassifierArtifact {
    pub fn predict(&self, features: &FeatureVector) -> ClassifierResult<Prediction> {
        self.predict_array(&features.to_array())
    }

    fn predict_array(&self, sample: &FeatureArray) -> ClassifierResult<Prediction> {
        let probabilities = self.forest.predict_proba(sample)?;
        Ok(Prediction::from_probabilities(probabilities))
    }

    /// Read and validate an artifact
    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::io(path, e))?;
        let artifact: ClassifierArtifact = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::IncompatibleArtifact(e.to_string()))?;
        artifact.check_compatible()?;
        Ok(artifact)
    }

    fn check_compatible(&self) -> ClassifierResult<()> {
        let meta = &self.metadata;
        if meta.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ClassifierError::IncompatibleArtifact(format!(
                "format version {} (expected {})",
                meta.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if meta.feature_count != FEATURE_COUNT
            || meta.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied())
        {
            return Err(ClassifierError::IncompatibleArtifact(format!(
                "feature schema mismatch ({} features)",
                meta.feature_count
            )));
        }
        if !self.forest.is_well_formed() {
            return Err(ClassifierError::IncompatibleArtifact(
                "model contains no valid trees".to_string(),
            ));
        }
        Ok(())
    }

    /// Write to a sibling temp file, then rename over `path`
    pub fn save(&self, path: &Path) -> ClassifierResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ClassifierError::io(path, e))?;
        }

        let json = serde_json::to_vec(self).map_err(|e| ClassifierError::io(path, e))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json).map_err(|e| ClassifierError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            ClassifierError::io(path, e)
        })
    }
}

// =============================================================================
// LIFECYCLE STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No classifier instance at all
    Unloaded,
    /// Fresh, untrained instance
    Created,
    /// Artifact read from disk
    Loaded,
    /// Fitted and persisted in this process
    Trained,
}

#[derive(Debug, Clone)]
enum ModelState {
    Unloaded,
    Created,
    Loaded(Arc<ClassifierArtifact>),
    Trained(Arc<ClassifierArtifact>),
}

impl ModelState {
    fn artifact(&self) -> Option<Arc<ClassifierArtifact>> {
        match self {
            ModelState::Loaded(artifact) | ModelState::Trained(artifact) => {
                Some(Arc::clone(artifact))
            },
            ModelState::Unloaded | ModelState::Created => None,
        }
    }

    fn lifecycle(&self) -> LifecycleState {
        match self {
            ModelState::Unloaded => LifecycleState::Unloaded,
            ModelState::Created => LifecycleState::Created,
            ModelState::Loaded(_) => LifecycleState::Loaded,
            ModelState::Trained(_) => LifecycleState::Trained,
        }
    }
}

// =============================================================================
// CLASSIFIER SERVICE
// =============================================================================

/// Owner of the current classifier artifact.
///
/// Readers take an `Arc` snapshot of the artifact and release the lock before
/// evaluating it. Mutating operations are serialized by `training_lock`; a new
/// artifact is fitted and saved before the pointer is swapped, so a concurrent
/// `predict` sees either the old model or the new one.
pub struct ClassifierService {
    model_path: PathBuf,
    settings: ClassifierSettings,
    state: RwLock<ModelState>,
    training_lock: Mutex<()>,
}

impl ClassifierService {
    pub fn new(model_path: impl Into<PathBuf>, settings: ClassifierSettings) -> Self {
        Self {
            model_path: model_path.into(),
            settings,
            state: RwLock::new(ModelState::Unloaded),
            training_lock: Mutex::new(()),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.read_state().lifecycle()
    }

    /// A classifier instance exists (trained or not)
    pub fn is_loaded(&self) -> bool {
        self.lifecycle_state() != LifecycleState::Unloaded
    }

    /// A fitted artifact is available for prediction
    pub fn is_trained(&self) -> bool {
        self.current_artifact().is_some()
    }

    /// Snapshot of the current artifact
    pub fn current_artifact(&self) -> Option<Arc<ClassifierArtifact>> {
        self.read_state().artifact()
    }

    pub fn artifact_metadata(&self) -> Option<ArtifactMetadata> {
        self.current_artifact().map(|a| a.metadata.clone())
    }

    pub fn artifact_exists(&self) -> bool {
        self.model_path.exists()
    }

    /// Load the persisted artifact, or fall back to a fresh untrained
    /// classifier. Returns whether an artifact was loaded.
    pub fn load_or_create(&self) -> bool {
        let _guard = self.lock_training();

        if self.model_path.exists() {
            match ClassifierArtifact::load(&self.model_path) {
                Ok(artifact) => {
                    info!(
                        "Model loaded successfully from {} (trained {}, accuracy {:.2})",
                        self.model_path.display(),
                        artifact.metadata.trained_at,
                        artifact.metadata.accuracy
                    );
                    self.publish(ModelState::Loaded(Arc::new(artifact)));
                    return true;
                },
                Err(e) => {
                    warn!("Error loading model from {}: {}", self.model_path.display(), e);
                },
            }
        }

        self.publish(ModelState::Created);
        info!("New model created");
        false
    }

    /// Fit on `examples`, evaluate on a held-out split, persist, then publish.
    /// Returns the held-out accuracy.
    pub fn train(&self, examples: &[TrainingExample]) -> ClassifierResult<f64> {
        let _guard = self.lock_training();
        self.train_locked(examples)
    }

    /// Train on the built-in seed set
    pub fn train_with_seed_data(&self, extractor: &UrlFeatureExtractor) -> ClassifierResult<f64> {
        self.train(&seed_training_set(extractor))
    }

    /// Delete the persisted artifact and refit the current instance
    pub fn retrain_in_place(&self, examples: &[TrainingExample]) -> ClassifierResult<f64> {
        let _guard = self.lock_training();

        self.delete_artifact_locked()?;
        self.train_locked(examples)
    }

    /// Drop the persisted artifact and the in-memory model, re-create, retrain.
    ///
    /// The previous snapshot stays readable until the new one is saved and
    /// published. If fitting or saving fails it is dropped anyway and the
    /// service is left with a fresh untrained instance.
    pub fn force_retrain(&self, examples: &[TrainingExample]) -> ClassifierResult<f64> {
        let _guard = self.lock_training();

        self.delete_artifact_locked()?;
        info!("Fitting replacement model for forced retraining");

        self.train_locked(examples).inspect_err(|e| {
            warn!("Forced retraining failed, discarding previous model: {}", e);
            self.publish(ModelState::Created);
        })
    }

    /// Delete the persisted artifact and unload the in-memory model
    pub fn reset(&self) -> ClassifierResult<()> {
        let _guard = self.lock_training();

        self.delete_artifact_locked()?;
        self.publish(ModelState::Unloaded);
        Ok(())
    }

    /// Delete the persisted artifact, leaving the in-memory model alone.
    /// Returns whether a file was removed.
    pub fn delete_artifact(&self) -> ClassifierResult<bool> {
        let _guard = self.lock_training();
        self.delete_artifact_locked()
    }

    pub fn predict(&self, features: &FeatureVector) -> ClassifierResult<Prediction> {
        let artifact = self
            .current_artifact()
            .ok_or(ClassifierError::ModelNotTrained)?;
        artifact.predict(features)
    }

    fn delete_artifact_locked(&self) -> ClassifierResult<bool> {
        match std::fs::remove_file(&self.model_path) {
            Ok(()) => {
                info!("Removed old model at {}", self.model_path.display());
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ClassifierError::io(&self.model_path, e)),
        }
    }

    fn train_locked(&self, examples: &[TrainingExample]) -> ClassifierResult<f64> {
        check_training_set(examples)?;

        let split = train_test_split(examples, self.settings.test_size, self.settings.random_state);
        if split.train.is_empty() || split.test.is_empty() {
            return Err(ClassifierError::InsufficientData(format!(
                "split of {} examples with test size {} leaves an empty partition",
                examples.len(),
                self.settings.test_size
            )));
        }

        let samples: Vec<FeatureArray> = split.train.iter().map(|e| e.features().to_array()).collect();
        let labels: Vec<Label> = split.train.iter().map(TrainingExample::label).collect();

        let mut forest = RandomForest::new(self.settings.forest_params());
        forest.fit(&samples, &labels)?;

        let predicted = split
            .test
            .iter()
            .map(|e| forest.predict(&e.features().to_array()))
            .collect::<Result<Vec<Label>, MlError>>()?;
        let actual: Vec<Label> = split.test.iter().map(TrainingExample::label).collect();
        let accuracy = accuracy(&predicted, &actual);

        let artifact = ClassifierArtifact {
            metadata: ArtifactMetadata {
                format_version: ARTIFACT_FORMAT_VERSION,
                feature_count: FEATURE_COUNT,
                feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                random_state: self.settings.random_state,
                trained_at: Utc::now(),
                training_examples: split.train.len(),
                held_out_examples: split.test.len(),
                accuracy,
            },
            forest,
        };

        artifact.save(&self.model_path)?;
        debug!("Model saved to {}", self.model_path.display());

        self.publish(ModelState::Trained(Arc::new(artifact)));
        info!("Model trained with accuracy: {:.2}", accuracy);

        Ok(accuracy)
    }

    fn publish(&self, next: ModelState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_training(&self) -> std::sync::MutexGuard<'_, ()> {
        self.training_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_training_set(examples: &[TrainingExample]) -> ClassifierResult<()> {
    if examples.len() < 2 {
        return Err(ClassifierError::InsufficientData(format!(
            "need at least 2 examples, got {}",
            examples.len()
        )));
    }

    let malicious = examples
        .iter()
        .filter(|e| e.label() == Label::Malicious)
        .count();
    if malicious == 0 || malicious == examples.len() {
        return Err(ClassifierError::InsufficientData(
            "both benign and malicious examples are required".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_settings() -> ClassifierSettings {
        ClassifierSettings {
            n_estimators: 10,
            ..ClassifierSettings::default()
        }
    }

    fn seed_examples() -> Vec<TrainingExample> {
        seed_training_set(&UrlFeatureExtractor::default())
    }

    #[test]
    fn test_predict_before_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let service = ClassifierService::new(dir.path().join("model.json"), fast_settings());
        let features = UrlFeatureExtractor::default()
            .extract("https://example.com")
            .unwrap();

        assert!(matches!(
            service.predict(&features),
            Err(ClassifierError::ModelNotTrained)
        ));

        service.load_or_create();
        assert_eq!(service.lifecycle_state(), LifecycleState::Created);
        assert!(matches!(
            service.predict(&features),
            Err(ClassifierError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_train_rejects_degenerate_sets() {
        let dir = tempfile::tempdir().unwrap();
        let service = ClassifierService::new(dir.path().join("model.json"), fast_settings());
        let examples = seed_examples();

        assert!(matches!(
            service.train(&examples[..1]),
            Err(ClassifierError::InsufficientData(_))
        ));
        // First ten are all benign
        assert!(matches!(
            service.train(&examples[..10]),
            Err(ClassifierError::InsufficientData(_))
        ));
        assert!(!service.artifact_exists());
    }

    #[test]
    fn test_train_persists_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let service = ClassifierService::new(dir.path().join("model.json"), fast_settings());

        let accuracy = service.train(&seed_examples()).unwrap();

        assert!((0.0..=1.0).contains(&accuracy));
        assert!(service.artifact_exists());
        assert_eq!(service.lifecycle_state(), LifecycleState::Trained);

        let artifact = service.current_artifact().unwrap();
        assert_eq!(artifact.metadata.training_examples, 16);
        assert_eq!(artifact.metadata.held_out_examples, 4);
        assert_eq!(artifact.metadata.feature_count, FEATURE_COUNT);
    }

    #[test]
    fn test_incompatible_artifact_falls_back_to_fresh_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let service = ClassifierService::new(&path, fast_settings());
        service.train(&seed_examples()).unwrap();

        let mut artifact = (*service.current_artifact().unwrap()).clone();
        artifact.metadata.format_version = ARTIFACT_FORMAT_VERSION + 1;
        artifact.save(&path).unwrap();

        let reloaded = ClassifierService::new(&path, fast_settings());
        assert!(!reloaded.load_or_create());
        assert_eq!(reloaded.lifecycle_state(), LifecycleState::Created);
    }

    #[test]
    fn test_reset_unloads_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let service = ClassifierService::new(dir.path().join("model.json"), fast_settings());
        service.train(&seed_examples()).unwrap();

        service.reset().unwrap();

        assert!(!service.artifact_exists());
        assert!(!service.is_loaded());
        assert!(!service.delete_artifact().unwrap());
    }

    #[test]
    fn test_save_does_not_leave_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let service = ClassifierService::new(&path, fast_settings());
        service.train(&seed_examples()).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("model.json.tmp").exists());
    }

    #[test]
    fn test_failed_force_retrain_drops_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let service = ClassifierService::new(&path, fast_settings());
        service.train(&seed_examples()).unwrap();

        assert!(service.force_retrain(&seed_examples()[..1]).is_err());

        assert!(!path.exists());
        assert!(!service.is_trained());
        assert_eq!(service.lifecycle_state(), LifecycleState::Created);
    }

    #[test]
    fn test_retrain_in_place_rewrites_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let service = ClassifierService::new(&path, fast_settings());
        let first = service.train(&seed_examples()).unwrap();

        let second = service.retrain_in_place(&seed_examples()).unwrap();

        assert_eq!(first, second);
        assert!(path.exists());
        assert_eq!(service.lifecycle_state(), LifecycleState::Trained);
    }
}
