//! Gradecast Server - academic performance prediction service

use anyhow::Result;
use gradecast_lib::{
    health::{components, HealthRegistry},
    ModelRegistry, PredictionService, StructuredLogger,
};
use gradecast_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting gradecast-server");

    let config = ServerConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_dir = %config.model_dir.display(),
        "Service configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::PREDICTOR).await;
    health_registry.check_model_store(&config.model_dir).await;
    if !health_registry.health().await.status.is_operational() {
        warn!(model_dir = %config.model_dir.display(), "Model directory missing, predictions will fail");
    }

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(SERVICE_VERSION, &config.model_dir.display().to_string());

    // Collections are loaded lazily on first use and shared by all requests
    let registry = Arc::new(ModelRegistry::with_fs_store());
    let service = Arc::new(
        PredictionService::new(registry, config.model_dir.clone()).with_logger(logger.clone()),
    );

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), service));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
