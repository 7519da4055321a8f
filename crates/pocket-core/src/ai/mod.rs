//! Pluggable text-generation backend abstraction
//!
//! This module provides a backend-agnostic interface for the one capability
//! the ledger needs: turn a prompt into raw text.
//!
//! # Architecture
//!
//! - `AIBackend` trait: `generate(prompt, max_tokens) -> text`
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `AnthropicCompatBackend`, `OllamaBackend`, `MockBackend`
//! - `parsing`: strict JSON extraction applied to every generated payload
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_env().expect("no AI backend configured");
//! let text = ai.generate("Output strictly in JSON: {\"ok\": true}", 100).await?;
//! let value = parsing::parse_strict_json(&text)?;
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (anthropic, ollama, mock). Default: anthropic
//! - `ANTHROPIC_COMPATIBLE_HOST`: Messages API base URL (required for anthropic backend)
//! - `ANTHROPIC_COMPATIBLE_MODEL`: Model name
//! - `ANTHROPIC_COMPATIBLE_API_KEY`: API key sent as `x-api-key` (optional)
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

pub mod anthropic_compat;
mod mock;
mod ollama;
pub mod parsing;

pub use anthropic_compat::AnthropicCompatBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all text-generation backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Generate text for a prompt, capped at `max_tokens` of output
    ///
    /// The caller expects the returned text to be a single JSON object.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Anthropic Messages API (or a compatible local server)
    AnthropicCompat(AnthropicCompatBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `anthropic` (default): Uses ANTHROPIC_COMPATIBLE_HOST / _MODEL / _API_KEY
    /// - `ollama`: Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `mock`: Creates an empty mock backend (every call fails until scripted)
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "anthropic".to_string());

        match backend.to_lowercase().as_str() {
            "anthropic" | "anthropic_compatible" | "claude" => {
                AnthropicCompatBackend::from_env().map(AIClient::AnthropicCompat)
            }
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to anthropic");
                AnthropicCompatBackend::from_env().map(AIClient::AnthropicCompat)
            }
        }
    }

    /// Wrap a scripted mock backend
    pub fn mock(backend: MockBackend) -> Self {
        AIClient::Mock(backend)
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        match self {
            AIClient::AnthropicCompat(b) => b.generate(prompt, max_tokens).await,
            AIClient::Ollama(b) => b.generate(prompt, max_tokens).await,
            AIClient::Mock(b) => b.generate(prompt, max_tokens).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::AnthropicCompat(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::AnthropicCompat(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::AnthropicCompat(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
