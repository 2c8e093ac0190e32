use picture_service::config::PictureConfig;
use picture_service::services::init_metrics;
use picture_service::Application;
use service_core::observability::{init_tracing, shutdown_tracing};

const SERVICE_NAME: &str = "picture-service";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Tracing is not up yet, so a bad config only surfaces as the exit error.
    let config = PictureConfig::load()
        .map_err(|e| std::io::Error::other(format!("Configuration error: {}", e)))?;

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty());
    init_tracing(
        SERVICE_NAME,
        &config.common.log_level,
        otlp_endpoint.as_deref(),
    );

    init_metrics().map_err(|e| {
        tracing::error!("Failed to initialize metrics: {}", e);
        std::io::Error::other(format!("Metrics error: {}", e))
    })?;

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Startup failed: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    let result = application.run_until_stopped().await;
    shutdown_tracing();
    result
}
