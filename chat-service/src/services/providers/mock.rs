//! Mock generator for local runs and testing.

use super::{GenerationConfig, GeneratorError, TextGenerator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Only the most recent prompts are kept.
const MAX_RECORDED_PROMPTS: usize = 64;

/// What the mock returns on each call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// A short on-topic sentence that passes the sanitizer.
    Canned,
    /// Always return this exact text.
    Fixed(String),
    /// Return replies in order, then fail once exhausted.
    Script(Vec<String>),
    /// Always fail as if the backend were down.
    Fail,
    /// Panic inside the call.
    Panic,
}

/// Mock text generator for testing.
pub struct MockTextGenerator {
    behavior: MockBehavior,
    calls: AtomicUsize,
    prompts: Mutex<VecDeque<String>>,
}

impl MockTextGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fixed(text.into()))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Fail)
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recent prompts received, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new(MockBehavior::Canned)
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, GeneratorError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            if prompts.len() == MAX_RECORDED_PROMPTS {
                prompts.pop_front();
            }
            prompts.push_back(prompt.to_string());
        }

        match &self.behavior {
            MockBehavior::Canned => Ok(
                "Sustainable choices such as saving energy and reducing waste lower your environmental footprint."
                    .to_string(),
            ),
            MockBehavior::Fixed(text) => Ok(text.clone()),
            MockBehavior::Script(replies) => replies.get(index).cloned().ok_or_else(|| {
                GeneratorError::ApiError(format!("mock script exhausted after {} replies", replies.len()))
            }),
            MockBehavior::Fail => Err(GeneratorError::NetworkError(
                "mock generator is offline".to_string(),
            )),
            MockBehavior::Panic => panic!("mock generator panicked"),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
