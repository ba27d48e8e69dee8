//! LLM client abstraction and the chat completions implementation

pub mod client;
pub mod openai;

pub use client::{GenerationRequest, TextGenerator};
pub use openai::ChatCompletionsClient;
