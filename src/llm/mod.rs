// file: src/llm/mod.rs
// description: chat capability trait over interchangeable LLM backends
// reference: structured generation contract

pub mod ollama;

pub use ollama::OllamaClient;

use crate::error::Result;
use std::future::Future;

/// One chat call against a structured-generation backend.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// Override of the backend's default model, used by the relevance gate
    /// which runs a smaller fine-tuned model.
    pub model: Option<&'a str>,
    pub system: &'a str,
    pub user: &'a str,
    /// Ask the backend for machine-parseable JSON output only.
    pub json_mode: bool,
    pub temperature: f32,
}

impl<'a> ChatRequest<'a> {
    pub fn new(system: &'a str, user: &'a str) -> Self {
        Self {
            model: None,
            system,
            user,
            json_mode: false,
            temperature: 0.0,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn with_model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// An opaque chat/completion capability. Given a system instruction and user
/// text it returns the raw reply string; callers parse defensively. Backends
/// that are unreachable surface `PipelineError::Capability`.
pub trait ChatCapability: Send + Sync {
    fn chat(&self, request: ChatRequest<'_>) -> impl Future<Output = Result<String>> + Send;
}
