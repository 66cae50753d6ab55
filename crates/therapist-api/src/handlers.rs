//! Route handler functions for all API endpoints.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use therapist_chat::{SessionSummary, TranscriptView};
use therapist_core::{ChatRequest, ChatResponseBody};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /`.
pub const ROOT_GREETING: &str = "Hello World!";

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
    pub upstream_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - fixed greeting.
pub async fn root() -> &'static str {
    ROOT_GREETING
}

/// POST /chat - relay a user message to the therapist model.
///
/// An empty body is treated as `{}` and yields the canned greeting.
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let request: ChatRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let outcome = state
        .orchestrator
        .handle_chat(request.message.as_deref(), request.session_id)
        .await?;

    Ok(Json(ChatResponseBody {
        messages: outcome.messages,
        session_id: outcome.session_id,
    }))
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.orchestrator.session_count(),
        upstream_configured: state.orchestrator.has_model(),
    })
}

/// GET /sessions - list live conversation sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.orchestrator.list_sessions().await,
    })
}

/// GET /sessions/{id} - transcript of one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TranscriptView>, ApiError> {
    Ok(Json(state.orchestrator.transcript(id).await?))
}

/// DELETE /sessions/{id} - forget a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.delete_session(id)?;
    tracing::info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}
