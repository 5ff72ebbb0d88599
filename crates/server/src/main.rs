//! Admission predictor server
//!
//! Loads the fitted artifacts once, then serves predictions over HTTP.

use admission_lib::{
    health::{components, HealthRegistry},
    predictor::IntakePolicy,
    PredictionContext, PredictorMetrics, StructuredLogger,
};
use admission_server::{api, config::ServerConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    let logger = StructuredLogger::new(&config.service_name);
    logger.log_startup(SERVER_VERSION, &config.artifact_dir.display().to_string());

    let health_registry = HealthRegistry::new();
    let artifacts = config.artifact_config();
    let context = match PredictionContext::load(&artifacts) {
        Ok(context) => context,
        Err(e) => {
            error!(error = %e, dir = %artifacts.dir.display(), "Failed to load artifacts");
            return Err(e).context("Refusing to serve without valid artifacts");
        }
    };

    let verified = context.is_verified();
    let metrics = PredictorMetrics::new();
    metrics.set_artifacts(context.classifier_name(), context.schema().len(), verified);
    logger.log_artifacts_loaded(context.classifier_name(), context.schema().len(), verified);

    health_registry.register(components::ARTIFACTS).await;
    health_registry.register(components::CLASSIFIER).await;
    if !verified {
        health_registry
            .set_degraded(
                components::ARTIFACTS,
                "Manifest missing or incomplete; checksums not verified",
            )
            .await;
    }

    let policy = IntakePolicy::default().with_catalog_enforcement(config.enforce_catalog);
    let state = Arc::new(
        api::AppState::new(Arc::new(context), health_registry.clone(), metrics, logger.clone())
            .with_policy(policy),
    );

    health_registry.set_ready(true).await;

    let shutdown_logger = logger.clone();
    api::serve(config.api_port, state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Server stopped");
    Ok(())
}
