//! Passthrough strategy: relay the prompt to a remote inference endpoint and
//! hand its reply back untouched.
//!
//! No topic filter, static table or sanitizer applies here.

use axum::body::Bytes;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("forward endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("forward endpoint timed out after {0} ms")]
    Timeout(u64),

    #[error("failed to read forward response: {0}")]
    Body(String),
}

/// Upstream reply, relayed as-is.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Serialize)]
struct ForwardRequest<'a> {
    prompt: &'a str,
}

pub struct PassthroughForwarder {
    url: String,
    timeout_ms: u64,
    client: Client,
}

impl PassthroughForwarder {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ForwardError::Unreachable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            timeout_ms,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[tracing::instrument(skip(self, prompt), fields(url = %self.url, prompt_len = prompt.len()))]
    pub async fn forward(
        &self,
        prompt: &str,
        request_id: Option<&str>,
    ) -> Result<ForwardedResponse, ForwardError> {
        let response = self
            .client
            .traced_post(&self.url)
            .json(&ForwardRequest { prompt })
            .timeout(Duration::from_millis(self.timeout_ms))
            .request_id(request_id)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForwardError::Timeout(self.timeout_ms)
                } else {
                    ForwardError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::Body(e.to_string()))?;

        tracing::debug!(status = %status, bytes = body.len(), "Forward endpoint replied");

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }
}
