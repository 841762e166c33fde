#![allow(dead_code)]

use axum::body::Body;
use axum::response::Response;
use axum::Router;
use chat_service::resolver::{AnswerResolver, ResolverSettings, TopicProfile};
use chat_service::services::providers::mock::MockTextGenerator;
use chat_service::services::{GeneratorHandle, PassthroughForwarder};
use chat_service::startup::{AppState, Application};
use chat_service::strategy::ChatStrategy;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Topical state over the built-in profile with the given mock as generator.
pub fn topical_state(generator: Arc<MockTextGenerator>) -> AppState {
    topical_state_with_handle(GeneratorHandle::ready(generator))
}

pub fn topical_state_with_handle(handle: GeneratorHandle) -> AppState {
    let resolver = AnswerResolver::new(
        Arc::new(TopicProfile::sustainability()),
        Arc::new(handle),
        ResolverSettings::default(),
    );
    AppState::new(ChatStrategy::Topical(Arc::new(resolver)))
}

pub fn passthrough_state(url: &str) -> AppState {
    let forwarder = PassthroughForwarder::new(url, 2_000).expect("Failed to build forwarder");
    AppState::new(ChatStrategy::Passthrough(Arc::new(forwarder)))
}

/// Serve `state` on a random port and return its base URL.
pub async fn spawn_app(state: AppState) -> String {
    let app = Application::with_state(0, state)
        .await
        .expect("Failed to build application");
    let port = app.http_port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{}", port)
}

/// Serve a stand-in upstream router on a random port and return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream");
    let addr = listener.local_addr().expect("Upstream has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Upstream failed");
    });
    format!("http://{}", addr)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub fn static_answer(keyword: &str) -> String {
    TopicProfile::sustainability()
        .answers
        .lookup(keyword)
        .expect("No static answer for keyword")
        .to_string()
}
