//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions                - Create a session
//! - GET  /api/v1/users/{id}/sessions     - List a user's sessions
//! - GET  /api/v1/sessions/{id}/messages  - Get messages for a session

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use counsel_core::repository::chat::ChatRepository;
use counsel_types::chat::{ChatSession, Message};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    pub name: String,
}

/// Session listing entry with its message count.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: ChatSession,
    pub message_count: u32,
}

/// POST /api/v1/sessions - Create a named session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<ChatSession>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Session name is required".to_string()));
    }

    let session = state
        .chat_service
        .create_session(body.user_id, body.name.trim().to_string())
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(session.clone(), request_id, elapsed)
        .with_link("messages", &format!("/api/v1/sessions/{}/messages", session.id));
    Ok(Json(resp))
}

/// GET /api/v1/users/{id}/sessions - List sessions, newest-updated first,
/// each with its message count.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.chat_service.list_sessions(&user_id).await?;
    let mut summaries = Vec::with_capacity(sessions.len());
    for session in sessions {
        let message_count = state.chat_service.get_message_count(&session.id).await?;
        summaries.push(SessionSummary {
            session,
            message_count,
        });
    }

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(summaries, request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{user_id}/sessions"));
    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id}/messages - Messages in creation order.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    // 404 on an unknown session rather than an empty list.
    state
        .chat_service
        .chat_repo()
        .get_session(&session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let messages = state.chat_service.get_messages(&session_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{session_id}/messages"));
    Ok(Json(resp))
}
