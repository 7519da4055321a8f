//! Mock backend for testing
//!
//! Replays scripted responses in order and records every prompt it receives.
//! Useful for unit tests and development without a running model server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<String>>,
    calls: Vec<(String, u32)>,
}

/// Mock AI backend for testing
///
/// Clones share the same script, so a test can keep a handle to inspect
/// prompts after passing a clone to the code under test.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    script: Arc<Mutex<Script>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default, nothing scripted)
    pub fn new() -> Self {
        Self {
            healthy: true,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Queue a successful generation
    pub fn push_response(&self, text: impl Into<String>) {
        self.with_script(|s| s.responses.push_back(Ok(text.into())));
    }

    /// Queue a failed generation
    pub fn push_failure(&self, message: impl Into<String>) {
        self.with_script(|s| {
            s.responses
                .push_back(Err(Error::Generation(message.into())))
        });
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.with_script(|s| s.calls.iter().map(|(p, _)| p.clone()).collect())
    }

    /// `max_tokens` passed with each call, in call order
    pub fn token_limits(&self) -> Vec<u32> {
        self.with_script(|s| s.calls.iter().map(|(_, t)| *t).collect())
    }

    /// Number of generate calls made
    pub fn call_count(&self) -> usize {
        self.with_script(|s| s.calls.len())
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut script)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.with_script(|s| {
            s.calls.push((prompt.to_string(), max_tokens));
            s.responses.pop_front().unwrap_or_else(|| {
                Err(Error::Generation(
                    "Mock backend has no scripted response".into(),
                ))
            })
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let mock = MockBackend::new();
        mock.push_response("first");
        mock.push_failure("boom");
        mock.push_response("third");

        assert_eq!(mock.generate("a", 1).await.unwrap(), "first");
        assert!(mock.generate("b", 2).await.is_err());
        assert_eq!(mock.generate("c", 3).await.unwrap(), "third");

        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
        assert_eq!(mock.token_limits(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unscripted_call_fails() {
        let mock = MockBackend::new();
        let err = mock.generate("anything", 10).await.unwrap_err();
        assert!(err.to_string().contains("no scripted response"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_script() {
        let mock = MockBackend::new();
        let handle = mock.clone();
        mock.push_response("x");

        handle.generate("p", 5).await.unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unhealthy() {
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
