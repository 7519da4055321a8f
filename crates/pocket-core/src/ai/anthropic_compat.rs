//! Anthropic Messages API backend
//!
//! Sends each prompt as a single user message to `/v1/messages` and returns
//! the concatenated text blocks of the reply. Works against the hosted API or
//! any server speaking the same protocol (Ollama 0.14+ included).
//!
//! # Configuration
//!
//! Environment variables:
//! - `ANTHROPIC_COMPATIBLE_HOST`: Base URL (e.g., `https://api.anthropic.com`)
//! - `ANTHROPIC_COMPATIBLE_MODEL`: Model to use
//! - `ANTHROPIC_COMPATIBLE_API_KEY`: Sent as `x-api-key`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AIBackend;
use crate::error::{Error, Result};

/// Protocol version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Anthropic Messages API request
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

/// Message in conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: text.into(),
        }
    }
}

/// Content block types
///
/// Only text blocks carry anything we use; other block types are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Other,
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Anthropic Messages API response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: String,
    pub stop_reason: Option<String>, // "end_turn", "max_tokens"
    pub usage: Option<Usage>,
}

/// Token usage information
#[derive(Debug, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl MessagesResponse {
    /// Extract text content from the response
    pub fn text(&self) -> Option<String> {
        let texts: Vec<_> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// Backend for the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicCompatBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl AnthropicCompatBackend {
    /// Create a new backend without an API key
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Set the key sent as `x-api-key`
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Create from environment (ANTHROPIC_COMPATIBLE_*)
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("ANTHROPIC_COMPATIBLE_HOST").ok()?;
        let model = std::env::var("ANTHROPIC_COMPATIBLE_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let backend = Self::new(&base_url, &model);
        Some(match std::env::var("ANTHROPIC_COMPATIBLE_API_KEY") {
            Ok(key) if !key.is_empty() => backend.with_api_key(key),
            _ => backend,
        })
    }

    /// Send a single-turn messages request
    pub async fn messages(&self, prompt: &str, max_tokens: u32) -> Result<MessagesResponse> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![Message::user(prompt)],
        };

        debug!(model = %self.model, max_tokens, "Sending Messages API request");

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.as_deref().unwrap_or("none"))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "Messages API error ({}): {}",
                status, body
            )));
        }

        let messages_response: MessagesResponse = response.json().await?;

        debug!(
            stop_reason = ?messages_response.stop_reason,
            "Received Messages API response"
        );

        Ok(messages_response)
    }
}

#[async_trait]
impl AIBackend for AnthropicCompatBackend {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.messages(prompt, max_tokens)
            .await?
            .text()
            .ok_or_else(|| Error::Generation("No text in response".into()))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .header("x-api-key", self.api_key.as_deref().unwrap_or("none"))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
