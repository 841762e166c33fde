pub mod chat;

pub use chat::{AnswerResponse, ChatRequest};
