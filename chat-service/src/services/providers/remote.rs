//! Remote inference endpoint generator.
//!
//! Speaks the Hugging Face text2text-generation wire format:
//! `{"inputs": ..., "parameters": {...}}` in, `[{"generated_text": ...}]`
//! (or a bare object) out.

use super::{GenerationConfig, GeneratorError, TextGenerator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

/// Remote generator configuration.
#[derive(Debug, Clone)]
pub struct RemoteGeneratorConfig {
    pub url: String,
    pub model: String,
    pub api_token: Option<Secret<String>>,
    pub timeout_ms: u64,
}

/// Generator backed by an HTTP inference endpoint.
pub struct RemoteTextGenerator {
    config: RemoteGeneratorConfig,
    client: Client,
}

impl RemoteTextGenerator {
    pub fn new(config: RemoteGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| GeneratorError::InitFailed(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Send a one-token request so a cold endpoint loads its weights before
    /// the first real question arrives.
    pub async fn warm_up(&self) -> Result<(), GeneratorError> {
        let config = GenerationConfig {
            max_output_length: 1,
            min_output_length: 0,
            ..GenerationConfig::factual()
        };

        match self.generate("ping", &config).await {
            // The text is irrelevant; the endpoint answered.
            Ok(_) | Err(GeneratorError::MalformedOutput(_)) => Ok(()),
            Err(e) => Err(GeneratorError::InitFailed(e.to_string())),
        }
    }

    fn build_request<'a>(&self, prompt: &'a str, config: &GenerationConfig) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_length: config.max_output_length,
                min_length: config.min_output_length,
                do_sample: config.use_sampling,
                temperature: config.use_sampling.then_some(config.temperature),
                top_p: config.use_sampling.then_some(config.top_p),
                top_k: config.use_sampling.then_some(config.top_k),
                repetition_penalty: config.repetition_penalty,
                num_beams: config.beam_count,
                early_stopping: config.early_stopping,
                no_repeat_ngram_size: config.no_repeat_ngram_size,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for RemoteTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GeneratorError> {
        let request = self.build_request(prompt, config);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to inference endpoint"
        );

        let mut builder = self.client.traced_post(&self.config.url).json(&request);
        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout(self.config.timeout_ms)
            } else {
                GeneratorError::NetworkError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status == StatusCode::SERVICE_UNAVAILABLE {
                return Err(GeneratorError::NotConfigured(format!(
                    "model is still loading: {}",
                    error_text
                )));
            }

            return Err(GeneratorError::ApiError(format!(
                "inference endpoint error {}: {}",
                status, error_text
            )));
        }

        let body: InferenceResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::MalformedOutput(format!("Failed to parse response: {}", e)))?;

        body.into_text()
            .ok_or_else(|| GeneratorError::MalformedOutput("no generated_text in response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    repetition_penalty: f32,
    num_beams: u32,
    early_stopping: bool,
    no_repeat_ngram_size: u32,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            InferenceResponse::Single(item) => Some(item.generated_text),
        }
    }
}
