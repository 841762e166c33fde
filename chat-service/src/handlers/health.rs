use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;
use crate::strategy::ChatStrategy;

/// Healthy once the generator is initialized. The passthrough strategy holds
/// no in-process generator and is always healthy.
fn is_healthy(state: &AppState) -> bool {
    match &state.strategy {
        ChatStrategy::Topical(resolver) => resolver.generator().is_initialized(),
        ChatStrategy::Passthrough(_) => true,
    }
}

/// Liveness probe.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if is_healthy(&state) {
        (StatusCode::OK, Json(json!({ "status": "healthy" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy" })),
        )
    }
}

/// Readiness probe.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if is_healthy(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
