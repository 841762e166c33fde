use std::sync::Arc;

use crate::resolver::AnswerResolver;
use crate::services::PassthroughForwarder;

/// How `/chat` produces its reply.
#[derive(Clone)]
pub enum ChatStrategy {
    /// Topic filter, static answers and validated generation.
    Topical(Arc<AnswerResolver>),
    /// Relay to a remote endpoint without any filtering.
    Passthrough(Arc<PassthroughForwarder>),
}

impl ChatStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ChatStrategy::Topical(_) => "topical",
            ChatStrategy::Passthrough(_) => "passthrough",
        }
    }
}
