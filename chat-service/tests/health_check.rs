//! Server-level tests: probes, service info and metrics against a spawned
//! application.

mod common;

use chat_service::config::ChatConfig;
use chat_service::services::providers::mock::MockTextGenerator;
use chat_service::services::{GeneratorError, GeneratorHandle, TextGenerator};
use chat_service::startup::Application;
use common::{spawn_app, topical_state, topical_state_with_handle};
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

fn broken_handle() -> GeneratorHandle {
    GeneratorHandle::new(
        "broken-model",
        Arc::new(|| {
            async {
                Err::<Arc<dyn TextGenerator>, _>(GeneratorError::InitFailed(
                    "weights missing".to_string(),
                ))
            }
            .boxed()
        }),
    )
}

#[tokio::test]
async fn health_check_returns_healthy_when_generator_ready() {
    let base = spawn_app(topical_state(Arc::new(MockTextGenerator::default()))).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn health_check_returns_unhealthy_when_generator_failed() {
    let base = spawn_app(topical_state_with_handle(broken_handle())).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "unhealthy");

    let ready = client
        .get(format!("{}/ready", base))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn static_answers_survive_a_broken_generator() {
    let base = spawn_app(topical_state_with_handle(broken_handle())).await;

    let response = Client::new()
        .post(format!("{}/chat", base))
        .json(&serde_json::json!({ "question": "tell me about recycling" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["answer"].as_str().unwrap().to_lowercase().contains("recycl"));
}

#[tokio::test]
async fn index_describes_the_service() {
    let base = spawn_app(topical_state(Arc::new(MockTextGenerator::default()))).await;

    let body: serde_json::Value = Client::new()
        .get(&base)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(body["message"], "Sustainability Chatbot API");
    assert_eq!(body["model"], "mock");
    assert_eq!(body["strategy"], "topical");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "POST /chat"));
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    service_core::middleware::init_metrics();
    let base = spawn_app(topical_state(Arc::new(MockTextGenerator::default()))).await;
    let client = Client::new();

    client
        .post(format!("{}/chat", base))
        .json(&serde_json::json!({ "question": "solar" }))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("chat_answers_total"));
}

#[tokio::test]
async fn application_builds_from_environment_defaults() {
    std::env::set_var("APP__PORT", "0");

    let config = ChatConfig::load().expect("Failed to load config");
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.http_port();
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    let client = Client::new();
    let health_url = format!("http://127.0.0.1:{}/health", port);

    // The default mock backend initializes in the background.
    let mut healthy = false;
    for _ in 0..50 {
        if let Ok(response) = client.get(&health_url).send().await {
            if response.status() == StatusCode::OK {
                healthy = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(healthy, "service never became healthy");
}
