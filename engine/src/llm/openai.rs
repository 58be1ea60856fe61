//! OpenAI-compatible Chat Provider
//!
//! Speaks the `/chat/completions` wire format against api.openai.com or any
//! compatible endpoint. The API key comes from config, falling back to the
//! OPENAI_API_KEY environment variable. Structured completions request
//! native JSON mode (`response_format: {"type": "json_object"}`).

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{parse_object, with_json_instruction, ChatProvider, LLMError, Message, Result};
use crate::config::OpenAIConfig;

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct OpenAIProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new provider from config, resolving the API key from the
    /// OPENAI_API_KEY environment variable when the config field is empty.
    pub fn new(config: &OpenAIConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };

        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    async fn chat(&self, payload: &Value) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthenticationFailed(
                "No OpenAI API key configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| LLMError::ParseError("No content in response".to_string()))?;

        Ok(content.to_string())
    }

    fn to_api_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages),
            "temperature": 0.7,
        });

        let content = self.chat(&payload).await?;
        if content.trim().is_empty() {
            return Err(LLMError::ParseError(
                "Model returned an empty reply".to_string(),
            ));
        }
        Ok(content)
    }

    async fn complete_json(&self, messages: &[Message], schema: &Value) -> Map<String, Value> {
        let prepared = with_json_instruction(messages, schema);
        let payload = json!({
            "model": self.model,
            "messages": Self::to_api_messages(&prepared),
            "temperature": 0.0,
            "response_format": { "type": "json_object" },
        });

        let content = match self.chat(&payload).await {
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
