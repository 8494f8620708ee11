// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub llm: LlmConfig,
    pub gate: GateConfig,
    pub retrieval: RetrievalConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Window size in bytes handed to the semantic extractor per call.
    pub size: usize,
    /// Overlap between consecutive windows. Must be strictly less than size,
    /// otherwise the stride is zero and chunking never terminates.
    pub overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub parallel_requests: usize,
    pub document_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    pub enabled: bool,
    /// Classifier model name. The fine-tuned filter is a different, smaller
    /// model than the extraction one.
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub enabled: bool,
    pub uri: String,
    pub table_name: String,
    pub top_k: usize,
    /// Maximum characters of the best match appended as related-incident
    /// context before chunking.
    pub snippet_chars: usize,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    /// Domain matches ending in one of these are file-path false positives.
    #[serde(default = "default_ignore_extensions")]
    pub ignore_extensions: Vec<String>,
    /// Benign infrastructure excluded from domain indicators.
    #[serde(default = "default_ignore_domains")]
    pub ignore_domains: Vec<String>,
    /// How many partial summaries the merge keeps, space-joined.
    pub summary_merge_limit: usize,
    /// Whether to run the dedicated whole-document summary pass.
    pub generate_summary: bool,
}

fn default_ignore_extensions() -> Vec<String> {
    [
        ".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".ttf", ".html", ".php",
        ".json", ".xml", ".txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ignore_domains() -> Vec<String> {
    [
        "sophos.com",
        "google.com",
        "microsoft.com",
        "schema.org",
        "w3.org",
        "twitter.com",
        "linkedin.com",
        "facebook.com",
        "cloudflare.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CTI_EXTRACT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            chunking: ChunkingConfig {
                size: 6000,
                overlap: 500,
            },
            llm: LlmConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "qwen2.5:14b".to_string(),
                temperature: 0.0,
                parallel_requests: 4,
                document_timeout_secs: 300,
            },
            gate: GateConfig {
                enabled: true,
                model: "qwen2.5:3b-filter".to_string(),
            },
            retrieval: RetrievalConfig {
                enabled: true,
                uri: "data/lancedb".to_string(),
                table_name: "threat_reports".to_string(),
                top_k: 1,
                snippet_chars: 200,
                embedding_api_key: None,
                embedding_model: "openai/gpt-oss-120b".to_string(),
            },
            extraction: ExtractionConfig {
                ignore_extensions: default_ignore_extensions(),
                ignore_domains: default_ignore_domains(),
                summary_merge_limit: 2,
                generate_summary: true,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 {
            return Err(PipelineError::Config(
                "chunking.size must be greater than 0".to_string(),
            ));
        }

        if self.chunking.overlap >= self.chunking.size {
            return Err(PipelineError::Config(format!(
                "chunking.overlap ({}) must be less than chunking.size ({}): the stride would be zero",
                self.chunking.overlap, self.chunking.size
            )));
        }

        if self.llm.parallel_requests == 0 {
            return Err(PipelineError::Config(
                "llm.parallel_requests must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(PipelineError::Config(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let mut config = Config::default_config();
        config.chunking.size = 500;
        config.chunking.overlap = 500;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_overlap_larger_than_size_rejected() {
        let mut config = Config::default_config();
        config.chunking.size = 100;
        config.chunking.overlap = 700;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default_config();
        config.llm.parallel_requests = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_ignore_sets_populated() {
        let config = Config::default_config();
        assert!(config.extraction.ignore_extensions.contains(&".js".to_string()));
        assert!(config.extraction.ignore_domains.contains(&"google.com".to_string()));
    }
}
