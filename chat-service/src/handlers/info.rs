use axum::{
    extract::State,
    http::{header, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::render_metrics;

use crate::startup::AppState;
use crate::strategy::ChatStrategy;

const ENDPOINTS: [&str; 6] = [
    "POST /chat",
    "POST /predict",
    "GET /health",
    "GET /ready",
    "GET /metrics",
    "GET /",
];

/// Service description.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let (message, model) = match &state.strategy {
        ChatStrategy::Topical(resolver) => (
            format!("{} Chatbot API", capitalize(&resolver.profile().topic)),
            resolver.generator().model_name().to_string(),
        ),
        ChatStrategy::Passthrough(forwarder) => {
            ("Chatbot API".to_string(), forwarder.url().to_string())
        }
    };

    Json(json!({
        "message": message,
        "model": model,
        "strategy": state.strategy.name(),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(),
    )
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for {}", uri.path()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
