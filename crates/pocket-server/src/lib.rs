//! Pocket Web Server
//!
//! Axum-based REST API for the Pocket expense ledger.
//!
//! Routes:
//! - `POST /api/query`: extract an expense from a free-text query and record it
//! - `GET /api/summaries/:month`: read a monthly savings summary
//! - `GET /api/health`: store and AI backend status
//!
//! Every failure is returned as `{"error": "..."}` with a matching status.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use pocket_core::ai::{AIBackend, AIClient};
use pocket_core::{BlobStore, FinanceAssistant};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    /// Blob store holding the ledger
    pub store: Arc<dyn BlobStore>,
    /// Query pipeline, absent when no AI backend is configured
    pub assistant: Option<FinanceAssistant>,
    /// Fixed "today" for every request (tests); defaults to the local date
    pub today: Option<NaiveDate>,
}

impl AppState {
    /// State for a fully configured assistant
    pub fn new(assistant: FinanceAssistant) -> Self {
        Self {
            store: assistant.store().clone(),
            assistant: Some(assistant),
            today: None,
        }
    }

    /// State without an AI backend; only read endpoints work
    pub fn without_ai(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            assistant: None,
            today: None,
        }
    }

    /// Pin the date used by every request
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The date a request runs on
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Create the application router
pub fn create_router(state: AppState, config: ServerConfig) -> Router {
    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/query", post(handlers::query))
        .route("/summaries/:month", get(handlers::get_summary))
        .route("/health", get(handlers::health));

    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    match state.assistant.as_ref() {
        Some(assistant) => check_ai_connection(assistant.ai()).await,
        None => info!(
            "ℹ️  AI backend not configured (set ANTHROPIC_COMPATIBLE_HOST or OLLAMA_HOST to enable queries)"
        ),
    }
    info!("Using {} store", state.store.name());

    let app = create_router(state, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(client: &AIClient) {
    if client.health_check().await {
        info!(
            "✅ AI backend connected: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        warn!(
            "⚠️  AI backend configured but not responding: {} (model: {})",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Raw generated text, echoed when it could not be parsed
    raw_response: Option<String>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            raw_response: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            raw_response: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            raw_response: None,
        }
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            raw_response: None,
        }
    }

    /// Generated text that broke the JSON contract
    pub fn parse_failure(detail: &str, raw: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Failed to parse AI response: {}", detail),
            raw_response: Some(raw.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "Request failed");
        }

        let mut body = serde_json::json!({ "error": self.message });
        if let Some(raw) = self.raw_response {
            body["raw_response"] = serde_json::Value::String(raw);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<pocket_core::Error> for AppError {
    fn from(err: pocket_core::Error) -> Self {
        use pocket_core::Error;

        match err {
            Error::Extraction(e) if e.is_client_error() => {
                warn!(error = %e, "No usable expense in generated payload");
                Self::bad_request("Could not extract expense details")
            }
            Error::Extraction(e) => Self::parse_failure(&e.to_string(), e.raw()),
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::NotFound(msg) => Self::not_found(&msg),
            // Unhandled faults echo their message
            other => Self::internal(&other.to_string()),
        }
    }
}
