// Common test utilities and helper structs
// Shared across all test files to avoid duplication
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use malicious_url_detector::{
    app::AppState, build_router, services::ClassifierSettings, AppConfig, ClassifierService,
    FeatureLog, UrlFeatureExtractor,
};
use serde::Serialize;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Forest size used by tests; large enough to be stable, small enough to be fast
pub const TEST_ESTIMATORS: usize = 20;

/// Configuration rooted in a fresh temporary directory
pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::for_paths(
        dir.path().join("model.json"),
        dir.path().join("url_features.csv"),
    );
    config.n_estimators = TEST_ESTIMATORS;
    config
}

pub fn test_settings() -> ClassifierSettings {
    ClassifierSettings {
        n_estimators: TEST_ESTIMATORS,
        ..ClassifierSettings::default()
    }
}

pub fn test_classifier(dir: &TempDir) -> ClassifierService {
    ClassifierService::new(dir.path().join("model.json"), test_settings())
}

pub fn extractor() -> UrlFeatureExtractor {
    UrlFeatureExtractor::default()
}

/// URLs used to compare predictions across model instances
pub const PROBE_URLS: &[&str] = &[
    "https://www.google.com",
    "https://docs.rs/axum/latest/axum/",
    "http://secure-login.tk/bank/verify?id=1",
    "http://bit.ly/abc123",
    "http://192.168.0.1/admin.php",
    "https://shop.example.co.uk/cart?item=42&qty=3#top",
];

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    // Keeps the model and feature log paths alive for the test's duration
    pub dir: TempDir,
}

impl TestApp {
    /// Send a POST request
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    /// Send a GET request
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    pub fn model_path(&self) -> PathBuf {
        self.state.config.model_path.clone()
    }

    pub fn features_path(&self) -> PathBuf {
        self.state.config.features_path.clone()
    }

    pub fn feature_log(&self) -> &FeatureLog {
        self.state.detector.feature_log()
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    request: Request<Body>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        Self { app, request }
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(self, body: &T) -> Self {
        self.raw_json(serde_json::to_vec(body).unwrap())
    }

    /// Add a raw body with a JSON content type
    pub fn raw_json(mut self, body: impl Into<Body>) -> Self {
        self.request = Request::builder()
            .method(self.request.method().clone())
            .uri(self.request.uri().clone())
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        self
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let response = self.app.app.clone().oneshot(self.request).await.unwrap();

        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    /// Get status code
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Parse JSON response
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Get response body as text
    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

/// Setup test application with an untrained model
pub async fn setup_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(test_config(&dir));
    let app = build_router(state.clone());

    TestApp { app, state, dir }
}

/// Setup test application and run startup initialization
pub async fn setup_trained_test_app() -> TestApp {
    let test_app = setup_test_app().await;
    let response = test_app.get("/startup").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    test_app
}
