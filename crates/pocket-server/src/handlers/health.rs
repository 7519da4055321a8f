//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use pocket_core::ai::AIBackend;
use pocket_core::BlobStore;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub store: String,
    pub ai: AiStatus,
}

#[derive(Debug, Serialize)]
pub struct AiStatus {
    pub configured: bool,
    pub available: bool,
    pub model: Option<String>,
    pub host: Option<String>,
}

/// GET /api/health - Store backend and live AI backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let ai = match state.assistant.as_ref() {
        Some(assistant) => {
            let client = assistant.ai();
            AiStatus {
                configured: true,
                available: client.health_check().await,
                model: Some(client.model().to_string()),
                host: Some(client.host().to_string()),
            }
        }
        None => AiStatus {
            configured: false,
            available: false,
            model: None,
            host: None,
        },
    };

    Json(HealthStatus {
        status: "ok",
        store: state.store.name().to_string(),
        ai,
    })
}
