// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration detected before any work starts. Fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or absent structured output from the semantic capability.
    /// Recovered by skipping the chunk.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// LLM or classifier backend unreachable. Recovered per call site.
    #[error("Capability unavailable: {0}")]
    Capability(String),

    /// Retrieval store or embedding failure. Recovered by proceeding
    /// without augmentation context.
    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the document-level pipeline may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::Config(_))
    }
}
