use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use malicious_url_detector::{build_app_state, build_router, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(config.log_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting malicious URL detector on {} ({})",
        config.bind_address, config.environment
    );

    let state = build_app_state(config);

    // Load or train the model before accepting requests
    let detector = Arc::clone(&state.detector);
    match tokio::task::spawn_blocking(move || detector.initialize())
        .await
        .context("Model initialization task failed")?
    {
        Ok(outcome) => info!(
            "Model ready (trained now: {}, accuracy: {})",
            outcome.trained_now,
            outcome
                .accuracy
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| "n/a".to_string())
        ),
        Err(e) => {
            error!("Model initialization failed: {}", e);
            return Err(anyhow::anyhow!("Model initialization failed: {}", e));
        },
    }

    let listener = tokio::net::TcpListener::bind(&state.config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", state.config.bind_address))?;
    info!("Listening on {}", listener.local_addr()?);

    let feature_log = state.detector.feature_log().clone();
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Flushing feature log");
    feature_log.flush().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
