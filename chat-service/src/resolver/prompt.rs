use std::fmt;

const PLACEHOLDER: &str = "{question}";

const BASIC: &str = "Answer this sustainability question: {question}";

const EXPERT: &str = "You are a sustainability expert. Answer the question below in two or three \
plain sentences. Stay strictly on sustainability and environmental topics, be concise, do not \
repeat yourself, and do not invent facts or statistics. If you are unsure, give general, \
well-established guidance.\n\nQuestion: {question}\nAnswer:";

/// Prompt text with a `{question}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    text: String,
}

impl PromptTemplate {
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            text: BASIC.to_string(),
        }
    }

    pub fn expert() -> Self {
        Self {
            name: "expert".to_string(),
            text: EXPERT.to_string(),
        }
    }

    /// A deployment-supplied template. Must contain `{question}`.
    pub fn custom(text: impl Into<String>) -> Result<Self, String> {
        let text = text.into();
        if !text.contains(PLACEHOLDER) {
            return Err(format!("prompt template must contain {}", PLACEHOLDER));
        }
        Ok(Self {
            name: "custom".to_string(),
            text,
        })
    }

    /// Resolve a configured value: a built-in name, or else literal template
    /// text.
    pub fn from_setting(setting: &str) -> Result<Self, String> {
        match setting.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::basic()),
            "expert" => Ok(Self::expert()),
            _ => Self::custom(setting),
        }
    }

    pub fn render(&self, question: &str) -> String {
        self.text.replace(PLACEHOLDER, question.trim())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::expert()
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
