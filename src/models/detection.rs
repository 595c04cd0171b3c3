// Request and response bodies for the detection API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::detector::ModelStatus;

/// Body of `POST /detect`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DetectRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainResponse {
    pub message: String,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartupResponse {
    pub status: String,
    pub trained_now: bool,
    #[serde(flatten)]
    pub model: ModelStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub model_loaded: bool,
}
