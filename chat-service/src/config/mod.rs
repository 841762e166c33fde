use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

use crate::resolver::{PromptTemplate, DEFAULT_COMPLEX_QUESTION_TOKENS};
use crate::services::providers::{GenerationConfig, GenerationPreset};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MIN_ANSWER_LENGTH: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub strategy: StrategyKind,
    pub generator: GeneratorSettings,
    pub resolver: ResolverConfig,
    pub forward: Option<ForwardConfig>,
    pub otlp_endpoint: Option<String>,
}

/// Which answer strategy serves `/chat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Topical,
    Passthrough,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topical" => Ok(StrategyKind::Topical),
            "passthrough" => Ok(StrategyKind::Passthrough),
            other => Err(format!("unknown resolver strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    Remote,
    Mock,
    Disabled,
}

impl FromStr for GeneratorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(GeneratorBackend::Remote),
            "mock" => Ok(GeneratorBackend::Mock),
            "disabled" | "none" => Ok(GeneratorBackend::Disabled),
            other => Err(format!("unknown generator backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSettings {
    pub backend: GeneratorBackend,
    pub url: String,
    pub model: String,
    #[serde(default)]
    pub api_token: Option<Secret<String>>,
    pub timeout_ms: u64,
    /// Initialize in the background at startup instead of on first use.
    pub eager_init: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    pub generation: GenerationConfig,
    /// Built-in template name (`basic`, `expert`) or literal template text.
    pub prompt_template: String,
    pub complex_question_tokens: usize,
    pub min_answer_length: usize,
    /// Topic profile file; the built-in sustainability profile when unset.
    pub topic_profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let strategy: StrategyKind =
            parse_setting("RESOLVER_STRATEGY", &get_env("RESOLVER_STRATEGY", Some("topical"), is_prod)?)?;

        let forward = match strategy {
            StrategyKind::Passthrough => Some(ForwardConfig {
                url: get_env("FORWARD_URL", None, is_prod)?,
                timeout_ms: parse_or("FORWARD_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            }),
            StrategyKind::Topical => None,
        };

        let default_backend = if is_prod { None } else { Some("mock") };
        let generator = GeneratorSettings {
            backend: parse_setting(
                "GENERATOR_BACKEND",
                &get_env("GENERATOR_BACKEND", default_backend, is_prod)?,
            )?,
            url: get_env(
                "GENERATOR_URL",
                Some("http://localhost:5000/generate"),
                is_prod && strategy == StrategyKind::Topical,
            )?,
            model: get_env("MODEL_NAME", Some("google/flan-t5-small"), false)?,
            api_token: env::var("GENERATOR_API_TOKEN").ok().map(Secret::new),
            timeout_ms: parse_or("GENERATOR_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            eager_init: parse_or("GENERATOR_EAGER_INIT", true),
        };

        let prompt_template = get_env("PROMPT_TEMPLATE", Some("expert"), false)?;
        PromptTemplate::from_setting(&prompt_template)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("PROMPT_TEMPLATE: {}", e)))?;

        let preset: GenerationPreset =
            parse_setting("GENERATION_PRESET", &get_env("GENERATION_PRESET", Some("creative"), false)?)?;

        let resolver = ResolverConfig {
            generation: generation_from_env(preset),
            prompt_template,
            complex_question_tokens: parse_or(
                "COMPLEX_QUESTION_TOKENS",
                DEFAULT_COMPLEX_QUESTION_TOKENS,
            ),
            min_answer_length: parse_or("MIN_ANSWER_LENGTH", DEFAULT_MIN_ANSWER_LENGTH),
            topic_profile_path: env::var("TOPIC_PROFILE_PATH").ok(),
        };

        Ok(ChatConfig {
            common: common_config,
            strategy,
            generator,
            resolver,
            forward,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
        })
    }
}

/// Start from the preset, then apply any per-knob `GENERATION_*` overrides.
fn generation_from_env(preset: GenerationPreset) -> GenerationConfig {
    let base = GenerationConfig::from_preset(preset);
    GenerationConfig {
        max_output_length: parse_or("GENERATION_MAX_OUTPUT_LENGTH", base.max_output_length),
        min_output_length: parse_or("GENERATION_MIN_OUTPUT_LENGTH", base.min_output_length),
        use_sampling: parse_or("GENERATION_USE_SAMPLING", base.use_sampling),
        temperature: parse_or("GENERATION_TEMPERATURE", base.temperature),
        top_p: parse_or("GENERATION_TOP_P", base.top_p),
        top_k: parse_or("GENERATION_TOP_K", base.top_k),
        repetition_penalty: parse_or("GENERATION_REPETITION_PENALTY", base.repetition_penalty),
        beam_count: parse_or("GENERATION_BEAM_COUNT", base.beam_count),
        early_stopping: parse_or("GENERATION_EARLY_STOPPING", base.early_stopping),
        no_repeat_ngram_size: parse_or("GENERATION_NO_REPEAT_NGRAM_SIZE", base.no_repeat_ngram_size),
    }
}

fn parse_setting<T: FromStr<Err = String>>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

/// Parse an optional variable, keeping the default when unset or invalid.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_and_backend_names_parse() {
        assert_eq!("Passthrough".parse::<StrategyKind>(), Ok(StrategyKind::Passthrough));
        assert_eq!("none".parse::<GeneratorBackend>(), Ok(GeneratorBackend::Disabled));
        assert!("grpc".parse::<GeneratorBackend>().is_err());
    }

    #[test]
    fn parse_setting_reports_the_key() {
        let err = parse_setting::<StrategyKind>("RESOLVER_STRATEGY", "sideways").unwrap_err();
        assert!(err.to_string().contains("RESOLVER_STRATEGY"));
    }

    #[test]
    fn get_env_uses_default_outside_production() {
        let value = get_env("CHAT_SERVICE_TEST_UNSET_VARIABLE", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
        assert!(get_env("CHAT_SERVICE_TEST_UNSET_VARIABLE", Some("fallback"), true).is_err());
        assert!(get_env("CHAT_SERVICE_TEST_UNSET_VARIABLE", None, false).is_err());
    }

    #[test]
    fn unset_overrides_keep_preset_values() {
        assert_eq!(
            generation_from_env(GenerationPreset::Factual),
            GenerationConfig::factual()
        );
    }
}
