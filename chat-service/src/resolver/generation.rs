use std::time::Instant;

use crate::resolver::prompt::PromptTemplate;
use crate::resolver::sanitizer::{Rejection, Sanitizer};
use crate::services::metrics;
use crate::services::providers::{GenerationConfig, GeneratorError};
use crate::services::GeneratorHandle;

/// Result of one generation attempt, consumed by the orchestration policy.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Sanitized text, ready to return.
    Generated(String),
    /// The collaborator could not produce text at all.
    Unavailable(GeneratorError),
    /// Text came back but failed validation.
    Rejected(Rejection),
}

impl GenerationOutcome {
    fn failure_reason(&self) -> Option<&'static str> {
        match self {
            GenerationOutcome::Generated(_) => None,
            GenerationOutcome::Unavailable(e) => Some(e.kind()),
            GenerationOutcome::Rejected(r) => Some(r.kind()),
        }
    }
}

/// Build the prompt, call the collaborator once, and validate what comes back.
///
/// Never fails: every error is folded into the outcome. No retry and no
/// timeout are applied here.
pub async fn generate_answer(
    generator: &GeneratorHandle,
    template: &PromptTemplate,
    config: &GenerationConfig,
    sanitizer: &Sanitizer,
    question: &str,
) -> GenerationOutcome {
    let outcome = match call_generator(generator, template, config, question).await {
        Ok(raw) => match sanitizer.validate_and_clean(&raw) {
            Ok(clean) => GenerationOutcome::Generated(clean),
            Err(rejection) => {
                tracing::warn!(reason = %rejection, raw_len = raw.len(), "Generated text rejected");
                GenerationOutcome::Rejected(rejection)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Text generation unavailable");
            GenerationOutcome::Unavailable(e)
        }
    };

    if let Some(reason) = outcome.failure_reason() {
        metrics::record_generation_failure(reason);
    }
    outcome
}

async fn call_generator(
    generator: &GeneratorHandle,
    template: &PromptTemplate,
    config: &GenerationConfig,
    question: &str,
) -> Result<String, GeneratorError> {
    let generator = generator.acquire().await?;
    let prompt = template.render(question);

    let start = Instant::now();
    let result = generator.generate(&prompt, config).await;
    metrics::record_generation(generator.model_name(), start.elapsed().as_secs_f64());

    let raw = result?;
    if raw.trim().is_empty() {
        return Err(GeneratorError::MalformedOutput("empty text".to_string()));
    }
    Ok(raw)
}
