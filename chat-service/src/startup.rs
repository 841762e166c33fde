//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use futures::FutureExt;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::{ChatConfig, GeneratorBackend, GeneratorSettings, StrategyKind};
use crate::handlers::{chat, health_check, index, metrics, not_found, readiness_check};
use crate::resolver::{AnswerResolver, PromptTemplate, ResolverSettings, TopicProfile};
use crate::services::providers::mock::MockTextGenerator;
use crate::services::providers::remote::{RemoteGeneratorConfig, RemoteTextGenerator};
use crate::services::providers::DisabledGenerator;
use crate::services::{
    GeneratorError, GeneratorFactory, GeneratorHandle, PassthroughForwarder, TextGenerator,
};
use crate::strategy::ChatStrategy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub strategy: ChatStrategy,
}

impl AppState {
    pub fn new(strategy: ChatStrategy) -> Self {
        Self { strategy }
    }

    /// Build the strategy named by the configuration.
    pub fn from_config(config: &ChatConfig) -> Result<Self, AppError> {
        let strategy = match config.strategy {
            StrategyKind::Topical => ChatStrategy::Topical(Arc::new(build_resolver(config)?)),
            StrategyKind::Passthrough => {
                let forward = config.forward.as_ref().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "FORWARD_URL is required for the passthrough strategy"
                    ))
                })?;
                let forwarder = PassthroughForwarder::new(&forward.url, forward.timeout_ms)
                    .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
                tracing::info!(url = %forward.url, "Passthrough strategy enabled");
                ChatStrategy::Passthrough(Arc::new(forwarder))
            }
        };

        Ok(Self::new(strategy))
    }
}

fn build_resolver(config: &ChatConfig) -> Result<AnswerResolver, AppError> {
    let profile = match &config.resolver.topic_profile_path {
        Some(path) => {
            let profile = TopicProfile::from_file(Path::new(path))
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            tracing::info!(path = %path, topic = %profile.topic, "Loaded topic profile");
            profile
        }
        None => TopicProfile::sustainability(),
    };

    let template = PromptTemplate::from_setting(&config.resolver.prompt_template)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("PROMPT_TEMPLATE: {}", e)))?;

    let settings = ResolverSettings {
        template,
        generation: config.resolver.generation.clone(),
        complex_question_tokens: config.resolver.complex_question_tokens,
        min_answer_length: config.resolver.min_answer_length,
    };

    tracing::info!(
        backend = ?config.generator.backend,
        model = %config.generator.model,
        template = %settings.template.name(),
        keywords = profile.keywords.len(),
        "Topical strategy enabled"
    );

    let generator = Arc::new(GeneratorHandle::new(
        config.generator.model.clone(),
        generator_factory(&config.generator),
    ));

    Ok(AnswerResolver::new(Arc::new(profile), generator, settings))
}

/// Factory for the configured backend. The remote backend warms the endpoint
/// up before reporting ready.
pub fn generator_factory(settings: &GeneratorSettings) -> GeneratorFactory {
    match settings.backend {
        GeneratorBackend::Remote => {
            let config = RemoteGeneratorConfig {
                url: settings.url.clone(),
                model: settings.model.clone(),
                api_token: settings.api_token.clone(),
                timeout_ms: settings.timeout_ms,
            };
            Arc::new(move || {
                let config = config.clone();
                async move {
                    let generator = RemoteTextGenerator::new(config)?;
                    generator.warm_up().await?;
                    Ok::<Arc<dyn TextGenerator>, GeneratorError>(Arc::new(generator))
                }
                .boxed()
            })
        }
        GeneratorBackend::Mock => Arc::new(|| {
            async { Ok::<Arc<dyn TextGenerator>, GeneratorError>(Arc::new(MockTextGenerator::default())) }
                .boxed()
        }),
        GeneratorBackend::Disabled => Arc::new(|| {
            async { Ok::<Arc<dyn TextGenerator>, GeneratorError>(Arc::new(DisabledGenerator)) }
                .boxed()
        }),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/predict", post(chat))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// With eager initialization the generator is built in a background task
    /// so the listener is up before the model is.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;

        if config.generator.eager_init {
            if let ChatStrategy::Topical(resolver) = &state.strategy {
                let resolver = resolver.clone();
                tokio::spawn(async move {
                    // Failures are logged by the handle; the first request retries.
                    let _ = resolver.generator().acquire().await;
                });
            }
        }

        Self::with_state(config.common.port, state).await
    }

    /// Bind `port` (0 picks a free one) and serve `state`.
    pub async fn with_state(port: u16, state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(strategy = state.strategy.name(), "Chat service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn http_port(&self) -> u16 {
        self.port
    }

    /// Run until the server fails or a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, build_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
