//! Ollama Chat Provider
//!
//! Implements the ChatProvider trait for Ollama, a local LLM backend
//! typically running at http://localhost:11434. Structured completions use
//! Ollama's native JSON mode (`"format": "json"`) at temperature 0.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{parse_object, with_json_instruction, ChatProvider, LLMError, Message, Result};
use crate::config::OllamaConfig;

const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Model name to use (e.g., "llama3.1:8b")
    model: String,

    /// HTTP client for API requests
    client: Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider from config
    pub fn new(config: &OllamaConfig) -> Self {
        Self::with_endpoint(&config.base_url, &config.model)
    }

    /// Create a new Ollama provider for an explicit endpoint
    pub fn with_endpoint(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Convert our Message format to Ollama's format
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }

    async fn chat(&self, request: &OllamaRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        tracing::debug!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ProviderUnavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(ollama_response.message.content)
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(messages),
            stream: false,
            format: None,
            options: Some(json!({ "temperature": 0.7 })),
        };

        let content = self.chat(&request).await?;
        if content.trim().is_empty() {
            return Err(LLMError::ParseError(
                "Model returned an empty reply".to_string(),
            ));
        }
        Ok(content)
    }

    async fn complete_json(&self, messages: &[Message], schema: &Value) -> Map<String, Value> {
        let prepared = with_json_instruction(messages, schema);
        let request = OllamaRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(&prepared),
            stream: false,
            format: Some("json".to_string()),
            options: Some(json!({ "temperature": 0.0 })),
        };

        let content = match self.chat(&request).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Structured completion failed");
                return Map::new();
            }
        };

        match parse_object(&content) {
            Some(fields) => fields,
            None => {
                tracing::warn!("Structured completion returned unusable output");
                Map::new()
            }
        }
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[allow(dead_code)]
    done: bool,
}
