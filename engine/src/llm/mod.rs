//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the two language-model
//! capabilities the turn pipeline consumes: a free-form chat completion and
//! a schema-constrained structured completion. The `ChatProvider` trait
//! defines the contract that all backends (Ollama, OpenAI-compatible)
//! implement, so the orchestrator never sees a concrete wire format.
//!
//! The two operations fail differently on purpose: `complete` propagates
//! transport errors (they abort the turn), while `complete_json` collapses
//! every failure mode (malformed output, schema-shaped garbage, transport
//! errors) into an empty field map the caller treats as "no signal".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::config::LLMConfig;

pub mod ollama;
pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,

    /// User message
    User,

    /// Assistant message
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat provider trait that all backends must implement
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama", "openai")
    fn name(&self) -> &str;

    /// Generate a free-form reply to the conversation.
    ///
    /// Transport and parse failures propagate; a blank reply is a parse
    /// failure, so a successful call always yields non-empty text.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Generate a structured reply constrained by a JSON schema.
    ///
    /// Returns the parsed top-level object, or an empty map when the model
    /// output cannot be used; the caller cannot and should not distinguish
    /// why.
    async fn complete_json(&self, messages: &[Message], schema: &Value) -> Map<String, Value>;
}

/// Build the configured chat provider.
pub fn build_provider(config: &LLMConfig) -> anyhow::Result<Arc<dyn ChatProvider>> {
    match config.default_provider.as_str() {
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::new(&config.ollama))),
        "openai" => Ok(Arc::new(openai::OpenAIProvider::new(&config.openai))),
        other => anyhow::bail!("Unknown LLM provider '{}'", other),
    }
}

/// Instruction appended to the system message of every structured completion.
pub(crate) fn json_instruction(schema: &Value) -> String {
    format!(
        "\n\nIMPORTANT: You must respond with valid JSON only. No markdown, no explanation. \
         Follow this schema:\n{}",
        serde_json::to_string_pretty(schema).unwrap_or_default()
    )
}

/// Prepare messages for a structured completion by appending the JSON
/// instruction to the system message (inserting one if absent).
pub(crate) fn with_json_instruction(messages: &[Message], schema: &Value) -> Vec<Message> {
    let instruction = json_instruction(schema);
    let mut prepared: Vec<Message> = messages.to_vec();

    match prepared.first_mut() {
        Some(first) if first.role == MessageRole::System => {
            first.content.push_str(&instruction);
        }
        _ => prepared.insert(0, Message::system(instruction)),
    }

    prepared
}

/// Parse a model reply as a JSON object, tolerating a wrapping markdown
/// code fence. Returns `None` for anything that is not an object.
pub(crate) fn parse_object(content: &str) -> Option<Map<String, Value>> {
    let trimmed = content.trim();

    let candidate = if trimmed.starts_with("```") {
        extract_fenced(trimmed)?.trim()
    } else {
        trimmed
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}
