use chat_service::config::ChatConfig;
use chat_service::startup::Application;
use service_core::middleware::init_metrics;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = ChatConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "chat-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    );
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        strategy = ?config.strategy,
        otlp_enabled = config.otlp_endpoint.is_some(),
        "Starting chat-service"
    );

    init_metrics();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
