// file: src/retrieval/embeddings.rs
// description: embedding API client with deterministic offline fallback
// reference: https://console.groq.com/docs/embeddings

use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/embeddings";

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings endpoint. The store never
/// calls the API directly; it goes through [`embed_with_fallback`] so a dead
/// endpoint or a model with the wrong output width degrades to the offline
/// embedding instead of failing ingest or search.
///
/// [`embed_with_fallback`]: EmbeddingClient::embed_with_fallback
pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            model,
        }
    }

    /// Point at a different OpenAI-compatible embeddings endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            input: [text],
            model: &self.model,
        };

        debug!("Requesting embedding for {} chars", text.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to send embedding request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Store(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            PipelineError::Store(format!("Failed to parse embedding response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| PipelineError::Store("No embedding data returned from API".to_string()))
    }

    /// Embed via the API, verifying the vector width, and fall back to the
    /// offline embedding on any failure. Never errors.
    pub async fn embed_with_fallback(&self, text: &str, dim: usize) -> Vec<f32> {
        match self.generate_embedding(text).await {
            Ok(embedding) if embedding.len() == dim => embedding,
            Ok(embedding) => {
                warn!(
                    "Embedding API returned dimension {}, expected {}. Using fallback.",
                    embedding.len(),
                    dim
                );
                Self::generate_fallback_embedding(text, dim)
            }
            Err(e) => {
                warn!("Embedding API failed: {}. Using fallback.", e);
                Self::generate_fallback_embedding(text, dim)
            }
        }
    }

    /// Deterministic offline embedding: an FNV-1a digest of the text,
    /// remixed per output position. No semantic value, but stable across
    /// runs so ingest and search stay consistent without an API key.
    pub fn generate_fallback_embedding(text: &str, dim: usize) -> Vec<f32> {
        let mut digest = 0xcbf2_9ce4_8422_2325u64;
        for byte in text.bytes() {
            digest ^= byte as u64;
            digest = digest.wrapping_mul(0x0000_0100_0000_01b3);
        }

        (0..dim)
            .map(|i| {
                let mixed = digest
                    .rotate_left((i % 63) as u32)
                    .wrapping_add(i as u64);
                (mixed % 2048) as f32 / 2048.0
            })
            .collect()
    }
}
