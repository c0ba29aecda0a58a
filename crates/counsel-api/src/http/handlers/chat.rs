//! Chat message handler.
//!
//! POST /api/v1/chat/message drives the full turn pipeline: admission
//! check, persist the user turn, consult the assistant, persist the
//! reply, record consumption.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use counsel_types::chat::ChatReply;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// Continuation token from a previous reply. None starts a fresh
    /// assistant thread.
    pub thread_id: Option<String>,
}

/// POST /api/v1/chat/message - Send a message and wait for the reply.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.content.trim().is_empty() {
        return Err(AppError::Validation("Message content is required".to_string()));
    }

    let reply = state
        .chat_service
        .send_message(
            body.session_id,
            body.user_id,
            body.content,
            body.thread_id,
        )
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(reply, request_id, elapsed).with_link(
        "messages",
        &format!("/api/v1/sessions/{}/messages", body.session_id),
    );
    Ok(Json(resp))
}
