// file: src/llm/ollama.rs
// description: Ollama chat API client with JSON-mode structured output
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::config::LlmConfig;
use crate::error::{PipelineError, Result};
use crate::llm::{ChatCapability, ChatRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    default_model: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            default_model: config.model.clone(),
        }
    }
}

impl ChatCapability for OllamaClient {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<String> {
        let url = format!("{}/api/chat", self.endpoint);
        let model = request.model.unwrap_or(&self.default_model);

        let body = OllamaChatRequest {
            model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: request.system,
                },
                OllamaMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            stream: false,
            format: request.json_mode.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        debug!(
            "Ollama chat call: model={}, user chars={}, json={}",
            model,
            request.user.len(),
            request.json_mode
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Capability(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Capability(format!(
                "Ollama returned status {}: {}",
                status, error_text
            )));
        }

        let reply: OllamaChatResponse = response.json().await.map_err(|e| {
            PipelineError::Capability(format!("Failed to parse Ollama response: {}", e))
        })?;

        debug!("Ollama reply: {} chars", reply.message.content.len());
        Ok(reply.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_with_json_mode() {
        let body = OllamaChatRequest {
            model: "qwen2.5:14b",
            messages: vec![OllamaMessage {
                role: "system",
                content: "extract entities",
            }],
            stream: false,
            format: Some("json"),
            options: OllamaOptions { temperature: 0.0 },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.0);
    }

    #[test]
    fn test_format_omitted_without_json_mode() {
        let body = OllamaChatRequest {
            model: "qwen2.5:14b",
            messages: vec![],
            stream: false,
            format: None,
            options: OllamaOptions { temperature: 0.1 },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("format").is_none());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = LlmConfig {
            endpoint: "http://localhost:11434/".to_string(),
            model: "qwen2.5:14b".to_string(),
            temperature: 0.0,
            parallel_requests: 2,
            document_timeout_secs: 60,
        };
        let client = OllamaClient::new(&config);
        assert_eq!(client.endpoint, "http://localhost:11434");
    }
}
