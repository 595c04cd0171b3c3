// Application state shared across handlers
use std::sync::Arc;

use crate::{app_config::AppConfig, services::DetectorService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub detector: Arc<DetectorService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let detector = Arc::new(DetectorService::from_config(&config));
        Self {
            config: Arc::new(config),
            detector,
        }
    }
}
