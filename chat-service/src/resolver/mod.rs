//! Answer resolution: decide whether to answer, where the answer comes from,
//! and what is safe to send back.
//!
//! Per request the resolver walks a fixed path:
//!
//! 1. blank question → [`ResolveError::EmptyQuestion`], nothing else runs;
//! 2. no topic keyword → refusal text with the restriction tag;
//! 3. static match on a short question → the static answer, no generation;
//! 4. otherwise one generation attempt, validated, falling back to the
//!    static match and then to the profile's default answer.
//!
//! A panic anywhere on that path is caught and turned into a fallback answer
//! flagged `error_handled`.

pub mod generation;
pub mod prompt;
pub mod sanitizer;
pub mod topic;

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

use crate::models::AnswerResponse;
use crate::services::metrics;
use crate::services::providers::GenerationConfig;
use crate::services::GeneratorHandle;

pub use generation::GenerationOutcome;
pub use prompt::PromptTemplate;
pub use sanitizer::{Rejection, Sanitizer};
pub use topic::{StaticAnswer, StaticAnswerTable, TopicKeywordSet, TopicProfile};

/// Questions with more whitespace-separated tokens than this are "complex"
/// and get a generation attempt even when a static answer matches.
pub const DEFAULT_COMPLEX_QUESTION_TOKENS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No question provided")]
    EmptyQuestion,
}

/// Where a response's answer text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Refusal,
    Static,
    Generated,
    StaticFallback,
    DefaultFallback,
    ErrorFallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Refusal => "refusal",
            AnswerSource::Static => "static",
            AnswerSource::Generated => "generated",
            AnswerSource::StaticFallback => "static_fallback",
            AnswerSource::DefaultFallback => "default_fallback",
            AnswerSource::ErrorFallback => "error_fallback",
        }
    }
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub response: AnswerResponse,
    pub source: AnswerSource,
}

/// Tunables that vary between deployments.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub template: PromptTemplate,
    pub generation: GenerationConfig,
    pub complex_question_tokens: usize,
    pub min_answer_length: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            template: PromptTemplate::default(),
            generation: GenerationConfig::default(),
            complex_question_tokens: DEFAULT_COMPLEX_QUESTION_TOKENS,
            min_answer_length: Sanitizer::default().min_length(),
        }
    }
}

pub struct AnswerResolver {
    profile: Arc<TopicProfile>,
    generator: Arc<GeneratorHandle>,
    sanitizer: Sanitizer,
    template: PromptTemplate,
    generation: GenerationConfig,
    complex_question_tokens: usize,
}

impl AnswerResolver {
    pub fn new(
        profile: Arc<TopicProfile>,
        generator: Arc<GeneratorHandle>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            profile,
            generator,
            sanitizer: Sanitizer::new(settings.min_answer_length),
            template: settings.template,
            generation: settings.generation,
            complex_question_tokens: settings.complex_question_tokens,
        }
    }

    pub fn profile(&self) -> &TopicProfile {
        &self.profile
    }

    pub fn generator(&self) -> &GeneratorHandle {
        &self.generator
    }

    pub fn is_on_topic(&self, question: &str) -> bool {
        self.profile.keywords.is_on_topic(question)
    }

    pub fn lookup_static(&self, question: &str) -> Option<&str> {
        self.profile.answers.lookup(question)
    }

    pub fn is_complex(&self, question: &str) -> bool {
        question.split_whitespace().count() > self.complex_question_tokens
    }

    /// One validated generation attempt for `question`.
    pub async fn generate(&self, question: &str) -> GenerationOutcome {
        generation::generate_answer(
            &self.generator,
            &self.template,
            &self.generation,
            &self.sanitizer,
            question,
        )
        .await
    }

    /// Resolve a question into a response.
    ///
    /// The only error is a blank question; every other failure ends in a
    /// fallback answer.
    pub async fn answer(&self, question: &str) -> Result<AnswerResponse, ResolveError> {
        self.resolve(question).await.map(|r| r.response)
    }

    /// Like [`answer`](Self::answer), also reporting the answer's source.
    pub async fn resolve(&self, question: &str) -> Result<Resolution, ResolveError> {
        if question.trim().is_empty() {
            return Err(ResolveError::EmptyQuestion);
        }

        let resolution = match AssertUnwindSafe(self.resolve_on_topic_or_refuse(question))
            .catch_unwind()
            .await
        {
            Ok(resolution) => resolution,
            Err(panic) => {
                tracing::error!(
                    panic = panic_message(&panic),
                    "Answer resolution panicked; returning fallback"
                );
                self.error_fallback(question)
            }
        };

        metrics::record_answer(resolution.source.as_str());
        tracing::info!(
            source = %resolution.source,
            tokens = question.split_whitespace().count(),
            "Question resolved"
        );
        Ok(resolution)
    }

    async fn resolve_on_topic_or_refuse(&self, question: &str) -> Resolution {
        if !self.is_on_topic(question) {
            return Resolution {
                response: AnswerResponse::new(question, self.profile.refusal.clone())
                    .with_restriction(self.profile.restriction.clone()),
                source: AnswerSource::Refusal,
            };
        }

        let static_answer = self.lookup_static(question);
        let complex = self.is_complex(question);

        let (answer, source) = match static_answer {
            Some(answer) if !complex => (answer.to_string(), AnswerSource::Static),
            _ => match self.generate(question).await {
                GenerationOutcome::Generated(text) => (text, AnswerSource::Generated),
                outcome => {
                    tracing::debug!(?outcome, has_static = static_answer.is_some(), "Falling back");
                    match static_answer {
                        Some(answer) => (answer.to_string(), AnswerSource::StaticFallback),
                        None => (
                            self.profile.default_answer.clone(),
                            AnswerSource::DefaultFallback,
                        ),
                    }
                }
            },
        };

        Resolution {
            response: AnswerResponse::new(question, answer).with_topic(self.profile.topic.clone()),
            source,
        }
    }

    fn error_fallback(&self, question: &str) -> Resolution {
        let answer = self
            .lookup_static(question)
            .map(str::to_string)
            .unwrap_or_else(|| self.profile.default_answer.clone());

        Resolution {
            response: AnswerResponse::new(question, answer).with_error_handled(),
            source: AnswerSource::ErrorFallback,
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
