//! Prompt composition and streamed answers from a local chat model.

pub mod ndjson;
pub mod ollama;
pub mod prompt;
pub mod streamer;

pub use ollama::{ChatMessage, ChatService, OllamaChat};
pub use prompt::PromptTemplate;
pub use streamer::{AnswerStream, AnswerStreamer, DeliverySummary};
