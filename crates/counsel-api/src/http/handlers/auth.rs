//! Account registration and lookup handlers.
//!
//! Endpoints:
//! - POST /api/v1/auth/register - Create an account (free tier, zeroed quota)
//! - POST /api/v1/auth/login    - Look up an account by email

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use counsel_core::repository::user::UserRepository;
use counsel_types::user::{Tier, User};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// POST /api/v1/auth/register - Create a new free-tier account.
///
/// The quota record is created eagerly so the first admission check reads
/// a real row. Duplicate emails return 409.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if body.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        email: body.email.trim().to_lowercase(),
        full_name: body.full_name.trim().to_string(),
        tier: Tier::Free,
        created_at: now,
        updated_at: now,
    };

    let ledger = state.chat_service.ledger();
    let created = ledger.user_repo().create_user(&user).await?;
    ledger.ensure_usage(&created.id).await?;

    tracing::info!(user_id = %created.id, "account registered");

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(created.clone(), request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{}", created.id));
    Ok(Json(resp))
}

/// POST /api/v1/auth/login - Look up an account by email.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let user = state
        .chat_service
        .ledger()
        .user_repo()
        .get_user_by_email(&body.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound("No account with that email".to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(user.clone(), request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{}", user.id));
    Ok(Json(resp))
}
