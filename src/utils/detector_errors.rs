// Detection API error handling
// Maps extraction, classifier and request failures onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{classifier::ClassifierError, feature_extractor::ExtractionError};

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("{0}")]
    InvalidUrl(#[from] ExtractionError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    #[error("Model storage error: {0}")]
    ArtifactIo(String),

    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Internal server error")]
    InternalError,
}

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<ClassifierError> for DetectorError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelNotTrained => DetectorError::ModelNotTrained,
            ClassifierError::InsufficientData(msg) => DetectorError::InsufficientData(msg),
            ClassifierError::ArtifactIo { .. } | ClassifierError::IncompatibleArtifact(_) => {
                DetectorError::ArtifactIo(err.to_string())
            },
            ClassifierError::Training(e) => DetectorError::TrainingFailed(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for DetectorError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors
                    .iter()
                    .map(move |e| format!("{}: {}", field, e.message.as_ref().unwrap_or(&e.code)))
            })
            .collect();

        DetectorError::ValidationError(messages.join(", "))
    }
}

impl From<tokio::task::JoinError> for DetectorError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {}", err);
        DetectorError::InternalError
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DetectorErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DetectorError {
    /// Get HTTP status code for error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectorError::InvalidUrl(_)
            | DetectorError::ValidationError(_)
            | DetectorError::BadRequest(_) => StatusCode::BAD_REQUEST,

            DetectorError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,

            DetectorError::ModelNotTrained => StatusCode::SERVICE_UNAVAILABLE,

            DetectorError::ArtifactIo(_)
            | DetectorError::TrainingFailed(_)
            | DetectorError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API response
    pub fn error_code(&self) -> &'static str {
        match self {
            DetectorError::InvalidUrl(_) => "INVALID_URL",
            DetectorError::ValidationError(_) => "VALIDATION_ERROR",
            DetectorError::BadRequest(_) => "BAD_REQUEST",
            DetectorError::ModelNotTrained => "MODEL_NOT_TRAINED",
            DetectorError::InsufficientData(_) => "INSUFFICIENT_DATA",
            DetectorError::ArtifactIo(_) => "ARTIFACT_IO_ERROR",
            DetectorError::TrainingFailed(_) => "TRAINING_FAILED",
            DetectorError::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Create error response
    pub fn to_response(&self) -> DetectorErrorResponse {
        let details = match self {
            DetectorError::InvalidUrl(ExtractionError::TooLong { max, current }) => {
                Some(serde_json::json!({ "max_length": max, "length": current }))
            },
            DetectorError::ModelNotTrained => {
                Some(serde_json::json!({ "hint": "POST /train to train a model" }))
            },
            _ => None,
        };

        DetectorErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details,
        }
    }
}

impl IntoResponse for DetectorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// RESULT TYPE
// =============================================================================

pub type DetectorResult<T> = Result<T, DetectorError>;

// =============================================================================
// TESTS
// =============================================================================
