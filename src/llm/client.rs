//! Text generation abstraction
//!
//! Section writers send a system prompt and a prompt and get text back.
//! Any OpenAI-compatible endpoint (OpenAI, OpenRouter, Ollama's `/v1`) is
//! served by [`ChatCompletionsClient`](super::ChatCompletionsClient).

use crate::types::Result;
use async_trait::async_trait;

/// A single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Which section or task the request is for, e.g. "cited sources"
    pub label: String,
    pub system: String,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(label: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// Generic text generator for provider abstraction
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate raw text; the output may be wrapped in code fences
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}
