// Centralized configuration management for the URL detector
// Every setting is read from the environment once at startup

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::services::classifier::ClassifierSettings;
use crate::services::feature_extractor::DEFAULT_MAX_URL_LENGTH;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,
    pub rust_log: String,

    // Storage
    pub model_path: PathBuf,
    pub features_path: PathBuf,
    pub feature_lists_path: PathBuf,

    // Feature extraction
    pub max_url_length: usize,

    // Training
    pub random_state: u64,
    pub test_size: f64,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub retrain_on_startup: bool,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_usize_or_default = |key: &str, default: &str| -> Result<usize, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid usize".to_string())
            })
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let parse_f64_or_default = |key: &str, default: &str| -> Result<f64, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid number".to_string())
            })
        };

        let parse_bool_or_default = |key: &str, default: &str| -> bool {
            get_or_default(key, default).to_lowercase() == "true"
        };

        // Parse bind address to extract port
        let bind_address = get_or_default("BIND_ADDRESS", "0.0.0.0:5000");
        let port = bind_address
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));

        // Unset or empty means unbounded
        let max_depth = match env::var("MAX_DEPTH") {
            Ok(value) if !value.trim().is_empty() => Some(value.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("MAX_DEPTH".to_string(), "not a valid usize".to_string())
            })?),
            _ => None,
        };

        let retrain_default = if environment == Environment::Production {
            "true"
        } else {
            "false"
        };

        let config = Self {
            bind_address,
            port,
            rust_log: get_or_default("RUST_LOG", "info"),
            model_path: get_or_default("MODEL_PATH", "malicious_url_model.json").into(),
            features_path: get_or_default("FEATURES_PATH", "url_features.csv").into(),
            feature_lists_path: get_or_default("FEATURE_LISTS_PATH", "data/feature_lists.json")
                .into(),
            max_url_length: parse_usize_or_default(
                "MAX_URL_LENGTH",
                &DEFAULT_MAX_URL_LENGTH.to_string(),
            )?,
            random_state: parse_u64_or_default("RANDOM_STATE", "42")?,
            test_size: parse_f64_or_default("TEST_SIZE", "0.2")?,
            n_estimators: parse_usize_or_default("N_ESTIMATORS", "100")?,
            max_depth,
            min_samples_split: parse_usize_or_default("MIN_SAMPLES_SPLIT", "2")?,
            retrain_on_startup: parse_bool_or_default("RETRAIN_ON_STARTUP", retrain_default),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    /// Test configuration with explicit storage paths and default settings.
    /// Does not read the environment.
    pub fn for_paths(model_path: impl Into<PathBuf>, features_path: impl Into<PathBuf>) -> Self {
        let settings = ClassifierSettings::default();
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            port: 0,
            environment: Environment::Test,
            rust_log: "info".to_string(),
            model_path: model_path.into(),
            features_path: features_path.into(),
            feature_lists_path: PathBuf::from("data/feature_lists.json"),
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            random_state: settings.random_state,
            test_size: settings.test_size,
            n_estimators: settings.n_estimators,
            max_depth: settings.max_depth,
            min_samples_split: settings.min_samples_split,
            retrain_on_startup: false,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigError::InvalidValue(
                "TEST_SIZE".to_string(),
                "must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(ConfigError::InvalidValue(
                "N_ESTIMATORS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue(
                "MAX_DEPTH".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.max_url_length == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_URL_LENGTH".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Training settings for the classifier service
    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            test_size: self.test_size,
            random_state: self.random_state,
        }
    }

    /// Log filter built from `RUST_LOG`, falling back to `info` when the
    /// directive string does not parse
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.rust_log).unwrap_or_else(|e| {
            eprintln!("Invalid RUST_LOG {:?} ({}), using info", self.rust_log, e);
            EnvFilter::new("info")
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Check if running in test environment
    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }
}
