//! `counselor serve` — the HTTP chat API.
//!
//! Routes:
//! - `GET /health`
//! - `POST /api/chat` (multipart: `userQuery`, `sessionId`, `file`)
//! - `GET /api/sessions`, `GET /api/sessions/:id`, `DELETE /api/sessions/:id`

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use counselor_agent::{ChatFailure, ChatRequest, SessionOrchestrator};
use counselor_core::config::Config;
use counselor_core::{ChatError, ErrorKind, Turn};

use crate::helpers;

/// Headroom for multipart framing and text fields on top of the attachment limit.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

// ─────────────────────────────────────────────
// State & router
// ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.orchestrator.max_attachment_bytes() + FORM_OVERHEAD_BYTES;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .with_state(state)
        // Enforced while the multipart stream is read, so oversized uploads
        // surface as a MultipartError with status 413.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the server until Ctrl+C.
pub async fn run(config: Config) -> Result<()> {
    let orchestrator = crate::build_orchestrator(&config)?;
    let model = orchestrator.gateway().model().to_string();
    let provider = orchestrator.gateway().display_name().to_string();

    let app = build_router(AppState {
        orchestrator: Arc::new(orchestrator),
    });

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    helpers::print_banner();
    println!("  Listening: http://{addr}");
    println!("  Model:     {model} ({provider})");
    println!(
        "  History:   compact above {} turns, keep {}",
        config.context.max_history_length, config.context.keep_recent
    );
    println!();
    println!("  Ctrl+C to stop");
    println!();

    info!(%addr, %model, %provider, "server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    println!("  Server stopped. Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Errors surfaced by the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    Chat(ChatError),
    Multipart(MultipartError),
    SessionNotFound(String),
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        ApiError::Chat(e)
    }
}

impl From<ChatFailure> for ApiError {
    fn from(failure: ChatFailure) -> Self {
        ApiError::Chat(failure.into_error())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart(e)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest | ErrorKind::EmptyQuery | ErrorKind::UnsupportedFormat => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InferenceUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Chat(e) => (status_for(e.kind()), e.kind().code(), e.to_string()),
            ApiError::Multipart(e) => {
                let status = e.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PAYLOAD_TOO_LARGE"
                } else {
                    "INVALID_REQUEST"
                };
                (status, code, e.body_text())
            }
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("Session not found: {id}"),
            ),
        };

        let body = serde_json::json!({
            "error": message,
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "counselor",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    chatbot_response: String,
    session_id: String,
    debug_history_length: usize,
}

async fn chat(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = read_chat_form(multipart).await?;
    let outcome = state.orchestrator.handle(request).await?;

    Ok(Json(ChatResponse {
        chatbot_response: outcome.reply,
        session_id: outcome.session_id,
        debug_history_length: outcome.history_len,
    }))
}

/// Collect the chat form fields. Unknown fields are ignored; an empty file
/// field counts as no attachment.
async fn read_chat_form(mut multipart: Multipart) -> Result<ChatRequest, ApiError> {
    let mut request = ChatRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("userQuery") => request.user_query = field.text().await?,
            Some("sessionId") => request.session_id = Some(field.text().await?),
            Some("file") => {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    request = request.with_attachment(bytes.to_vec(), filename);
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.store().list_sessions().await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    session_id: String,
    history: Vec<Turn>,
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let history = state
        .orchestrator
        .store()
        .get(&id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

    Ok(Json(SessionView {
        session_id: id,
        history,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let removed = state.orchestrator.store().remove(&id).await;
    Json(serde_json::json!({ "removed": removed }))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
