// HTTP handlers for the URL detector

pub mod detection;
pub mod model;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Detection and model management routes
pub fn detector_routes() -> Router<AppState> {
    Router::new()
        .route("/detect", post(detection::detect_url))
        .route("/train", post(model::train_model))
        .route("/force-retrain", post(model::force_retrain))
        .route("/status", get(model::model_status))
        .route("/startup", get(model::startup))
        .route("/health", get(model::health_check))
}

/// Full application router with request tracing
pub fn build_router(state: AppState) -> Router {
    detector_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
