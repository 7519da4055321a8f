//! Test utilities for pocket-core
//!
//! This module provides a mock generation server speaking both the Anthropic
//! Messages API and Ollama's native API, for adapter and integration tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// A request received by the mock server
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Endpoint path (`/v1/messages` or `/api/generate`)
    pub path: String,
    pub model: String,
    pub prompt: String,
    pub max_tokens: Option<u64>,
    /// `x-api-key` header, Messages API only
    pub api_key: Option<String>,
    /// `anthropic-version` header, Messages API only
    pub version: Option<String>,
}

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn next_reply(&self, request: RecordedRequest) -> Option<String> {
        self.requests
            .lock()
            .expect("mock state poisoned")
            .push(request);
        self.replies.lock().expect("mock state poisoned").pop_front()
    }
}

/// Mock generation server for testing and development
///
/// Replies are served in the order they were pushed. A request arriving with
/// nothing queued gets an HTTP 500.
pub struct MockMessagesServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockMessagesServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/v1/messages", post(handle_messages))
            .route("/v1/models", get(handle_models))
            .route("/api/generate", post(handle_generate))
            .route("/api/tags", get(handle_tags))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("mock server");
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue the text of the next generation
    pub fn push_reply(&self, text: impl Into<String>) {
        self.state
            .replies
            .lock()
            .expect("mock state poisoned")
            .push_back(text.into());
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .expect("mock state poisoned")
            .clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockMessagesServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn no_reply() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "type": "error",
            "error": {"type": "api_error", "message": "no scripted reply"}
        })),
    )
        .into_response()
}

/// Anthropic Messages API endpoint
async fn handle_messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    let recorded = RecordedRequest {
        path: "/v1/messages".into(),
        model: request["model"].as_str().unwrap_or_default().to_string(),
        prompt: request["messages"][0]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        max_tokens: request["max_tokens"].as_u64(),
        api_key: header(&headers, "x-api-key"),
        version: header(&headers, "anthropic-version"),
    };
    let model = recorded.model.clone();

    match state.next_reply(recorded) {
        Some(text) => Json(json!({
            "id": "msg_mock",
            "type": "message",
            "role": "assistant",
            "model": model,
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {"input_tokens": 10, "output_tokens": 10}
        }))
        .into_response(),
        None => no_reply(),
    }
}

/// Messages API model listing (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({"data": [{"type": "model", "id": "mock-model"}]}))
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Json(request): Json<Value>,
) -> Response {
    let recorded = RecordedRequest {
        path: "/api/generate".into(),
        model: request["model"].as_str().unwrap_or_default().to_string(),
        prompt: request["prompt"].as_str().unwrap_or_default().to_string(),
        max_tokens: request["options"]["num_predict"].as_u64(),
        api_key: None,
        version: None,
    };
    let model = recorded.model.clone();

    match state.next_reply(recorded) {
        Some(text) => Json(json!({"model": model, "response": text, "done": true})).into_response(),
        None => no_reply(),
    }
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({"models": [{"name": "llama3.2:latest"}]}))
}
