//! Passthrough strategy: requests are relayed to an upstream endpoint
//! unchanged and its reply comes back unchanged.

mod common;

use axum::http::StatusCode as AxumStatus;
use axum::{routing::post, Json, Router};
use common::{passthrough_state, spawn_app, spawn_upstream};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

async fn echo_upstream() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/predict",
        post(move |Json(body): Json<Value>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "response": format!("echo: {}", body["prompt"].as_str().unwrap_or("")) }))
            }
        }),
    );
    (format!("{}/predict", spawn_upstream(router).await), hits)
}

#[tokio::test]
async fn relays_upstream_reply_unchanged() {
    let (upstream, hits) = echo_upstream().await;
    let base = spawn_app(passthrough_state(&upstream)).await;

    let response = Client::new()
        .post(format!("{}/chat", base))
        .json(&json!({ "question": "what's the weather today" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    // No topic filter on this strategy.
    assert_eq!(body, json!({ "response": "echo: what's the weather today" }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn upstream_error_status_is_relayed() {
    let router = Router::new().route(
        "/predict",
        post(|| async {
            (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "model crashed" })),
            )
        }),
    );
    let upstream = format!("{}/predict", spawn_upstream(router).await);
    let base = spawn_app(passthrough_state(&upstream)).await;

    let response = Client::new()
        .post(format!("{}/predict", base))
        .json(&json!({ "prompt": "solar" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "model crashed");
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let base = spawn_app(passthrough_state("http://127.0.0.1:1/predict")).await;

    let response = Client::new()
        .post(format!("{}/chat", base))
        .json(&json!({ "question": "solar" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn blank_question_never_reaches_upstream() {
    let (upstream, hits) = echo_upstream().await;
    let base = spawn_app(passthrough_state(&upstream)).await;

    let response = Client::new()
        .post(format!("{}/chat", base))
        .json(&json!({ "question": "   " }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn passthrough_is_always_healthy() {
    let base = spawn_app(passthrough_state("http://127.0.0.1:1/predict")).await;

    let response = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
}
