use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use service_core::observability::REQUEST_ID_HEADER;
use validator::Validate;

use crate::models::ChatRequest;
use crate::resolver::ResolveError;
use crate::services::{metrics, ForwardError, PassthroughForwarder};
use crate::startup::AppState;
use crate::strategy::ChatStrategy;

/// `POST /chat` and the legacy `POST /predict`.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable chat request body");
        no_question()
    })?;
    if request.validate().is_err() {
        return Err(no_question());
    }

    match &state.strategy {
        ChatStrategy::Topical(resolver) => {
            let response = resolver.answer(&request.question).await.map_err(|e| match e {
                ResolveError::EmptyQuestion => no_question(),
            })?;
            Ok(Json(response).into_response())
        }
        ChatStrategy::Passthrough(forwarder) => {
            let request_id = headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok());
            relay(forwarder, &request.question, request_id).await
        }
    }
}

async fn relay(
    forwarder: &PassthroughForwarder,
    prompt: &str,
    request_id: Option<&str>,
) -> Result<Response, AppError> {
    let reply = match forwarder.forward(prompt, request_id).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, url = %forwarder.url(), "Passthrough forward failed");
            metrics::record_forward(match &e {
                ForwardError::Timeout(_) => "timeout",
                _ => "error",
            });
            return Err(AppError::BadGateway(e.to_string()));
        }
    };

    metrics::record_forward(if reply.status.is_success() { "ok" } else { "upstream_error" });

    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    if let Some(value) = reply
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}

fn no_question() -> AppError {
    AppError::BadRequest(anyhow::anyhow!("No question provided"))
}
