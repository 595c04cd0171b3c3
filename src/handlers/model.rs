// Model management and health endpoints

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    app::AppState,
    models::detection::{HealthResponse, StartupResponse, TrainResponse},
    services::DetectorService,
    utils::detector_errors::{DetectorError, DetectorResult},
};

// =============================================================================
// TRAINING HANDLERS
// =============================================================================

/// Drop the persisted model and retrain on the seed set
/// POST /train
pub async fn train_model(State(state): State<AppState>) -> impl IntoResponse {
    match run_blocking(&state.detector, |detector| detector.retrain(false)).await {
        Ok(accuracy) => {
            info!("Model trained successfully (accuracy {:.2})", accuracy);
            Json(TrainResponse {
                message: "Model trained successfully".to_string(),
                accuracy,
                status: None,
            })
            .into_response()
        },
        Err(e) => {
            error!("Training failed: {}", e);
            e.into_response()
        },
    }
}

/// Discard the in-memory and persisted model, then train a fresh one
/// POST /force-retrain
pub async fn force_retrain(State(state): State<AppState>) -> impl IntoResponse {
    match run_blocking(&state.detector, |detector| detector.retrain(true)).await {
        Ok(accuracy) => Json(TrainResponse {
            message: "Model force retrained successfully".to_string(),
            accuracy,
            status: Some("ready".to_string()),
        })
        .into_response(),
        Err(e) => {
            error!("Force retrain failed: {}", e);
            e.into_response()
        },
    }
}

// =============================================================================
// STATUS HANDLERS
// =============================================================================

/// GET /status
pub async fn model_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.detector.status())
}

/// Initialize the model if that has not happened yet
/// GET /startup
pub async fn startup(State(state): State<AppState>) -> impl IntoResponse {
    match run_blocking(&state.detector, DetectorService::initialize).await {
        Ok(outcome) => Json(StartupResponse {
            status: "ready".to_string(),
            trained_now: outcome.trained_now,
            model: state.detector.status(),
        })
        .into_response(),
        Err(e) => {
            error!("Startup initialization failed: {}", e);
            e.into_response()
        },
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        model_loaded: state.detector.classifier().is_loaded(),
    })
}

/// Run a training-class operation on the blocking pool
async fn run_blocking<T, F>(detector: &Arc<DetectorService>, operation: F) -> DetectorResult<T>
where
    T: Send + 'static,
    F: FnOnce(&DetectorService) -> DetectorResult<T> + Send + 'static,
{
    let detector = Arc::clone(detector);
    tokio::task::spawn_blocking(move || operation(&detector))
        .await
        .map_err(DetectorError::from)?
}
