//! Text-generation collaborators.
//!
//! The resolver only ever sees [`TextGenerator`]; which backend sits behind
//! it (a remote inference endpoint, the in-process mock, or nothing at all)
//! is a deployment decision made in `startup`.

pub mod mock;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Error type for generator operations.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Generator initialization failed: {0}")]
    InitFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),
}

impl GeneratorError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorError::NotConfigured(_) => "not_configured",
            GeneratorError::InitFailed(_) => "init_failed",
            GeneratorError::ApiError(_) => "api_error",
            GeneratorError::NetworkError(_) => "network_error",
            GeneratorError::Timeout(_) => "timeout",
            GeneratorError::MalformedOutput(_) => "malformed_output",
        }
    }
}

/// Decoding knobs passed to the generator on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_output_length: u32,
    pub min_output_length: u32,
    pub use_sampling: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
    pub beam_count: u32,
    pub early_stopping: bool,
    pub no_repeat_ngram_size: u32,
}

impl GenerationConfig {
    /// Sampled decoding for varied, conversational answers.
    pub fn creative() -> Self {
        Self {
            max_output_length: 200,
            min_output_length: 30,
            use_sampling: true,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            repetition_penalty: 1.2,
            beam_count: 1,
            early_stopping: false,
            no_repeat_ngram_size: 2,
        }
    }

    /// Greedy beam search for stable, factual answers.
    pub fn factual() -> Self {
        Self {
            max_output_length: 150,
            min_output_length: 20,
            use_sampling: false,
            temperature: 1.0,
            top_p: 1.0,
            top_k: 50,
            repetition_penalty: 1.3,
            beam_count: 4,
            early_stopping: true,
            no_repeat_ngram_size: 3,
        }
    }

    pub fn from_preset(preset: GenerationPreset) -> Self {
        match preset {
            GenerationPreset::Creative => Self::creative(),
            GenerationPreset::Factual => Self::factual(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::creative()
    }
}

/// Named starting points for [`GenerationConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPreset {
    Creative,
    Factual,
}

impl FromStr for GenerationPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creative" => Ok(GenerationPreset::Creative),
            "factual" | "deterministic" => Ok(GenerationPreset::Factual),
            other => Err(format!("unknown generation preset '{}'", other)),
        }
    }
}

/// The generation collaborator: prompt in, raw text out.
///
/// Implementations may block for the whole inference; callers run each
/// request on its own task. Serializing concurrent calls, if a backend needs
/// it, is the implementation's job.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GeneratorError>;

    /// Name reported by `/` and in logs.
    fn model_name(&self) -> &str;
}

/// Backend used when generation is switched off: every call is unavailable,
/// so answers come from the static table and defaults only.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, GeneratorError> {
        Err(GeneratorError::NotConfigured(
            "text generation is disabled".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_in_decoding_strategy() {
        let creative = GenerationConfig::creative();
        let factual = GenerationConfig::factual();

        assert!(creative.use_sampling);
        assert_eq!(creative.beam_count, 1);
        assert!(!factual.use_sampling);
        assert!(factual.early_stopping);
        assert!(factual.beam_count > 1);
    }

    #[test]
    fn preset_names_parse_case_insensitively() {
        assert_eq!(
            "Factual".parse::<GenerationPreset>(),
            Ok(GenerationPreset::Factual)
        );
        assert_eq!(
            "deterministic".parse::<GenerationPreset>(),
            Ok(GenerationPreset::Factual)
        );
        assert_eq!(
            " creative ".parse::<GenerationPreset>(),
            Ok(GenerationPreset::Creative)
        );
        assert!("wild".parse::<GenerationPreset>().is_err());
    }

    #[tokio::test]
    async fn disabled_generator_always_fails() {
        let err = DisabledGenerator
            .generate("anything", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_configured");
    }
}
