// URL detection endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::{app::AppState, models::detection::DetectRequest, utils::detector_errors::DetectorError};

// =============================================================================
// DETECTION HANDLERS
// =============================================================================

/// Classify a URL as benign or malicious
/// POST /detect
pub async fn detect_url(
    State(state): State<AppState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return DetectorError::BadRequest(rejection.body_text()).into_response();
        },
    };

    // Validate request
    if let Err(e) = request.validate() {
        return DetectorError::from(e).into_response();
    }

    // Prediction is CPU-bound
    let detector = Arc::clone(&state.detector);
    let url = request.url;
    let result = tokio::task::spawn_blocking(move || detector.classify(&url)).await;

    match result {
        Ok(Ok(classification)) => {
            info!(
                "URL {} classified as {} (confidence {:.2})",
                classification.url,
                if classification.is_malicious {
                    "malicious"
                } else {
                    "benign"
                },
                classification.confidence
            );
            Json(classification).into_response()
        },
        Ok(Err(e)) => {
            warn!("Detection failed: {}", e);
            e.into_response()
        },
        Err(e) => DetectorError::from(e).into_response(),
    }
}
