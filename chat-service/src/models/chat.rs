use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body of `POST /chat` and `POST /predict`.
///
/// `prompt` is accepted for clients of the older `/predict` endpoint. A
/// missing field deserializes as empty and fails validation.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default, alias = "prompt")]
    #[validate(custom(function = "not_blank"))]
    pub question: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Resolved answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_restriction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handled: Option<bool>,
}

impl AnswerResponse {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            topic: None,
            topic_restriction: None,
            error_handled: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_restriction(mut self, restriction: impl Into<String>) -> Self {
        self.topic_restriction = Some(restriction.into());
        self
    }

    pub fn with_error_handled(mut self) -> Self {
        self.error_handled = Some(true);
        self
    }
}
