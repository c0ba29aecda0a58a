//! User profile and usage handlers.
//!
//! Endpoints:
//! - GET /api/v1/users/{id}       - Profile with usage, limits, subscription
//! - GET /api/v1/users/{id}/files - All files the user has uploaded

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use counsel_core::repository::file::FileRepository;
use counsel_core::repository::user::UserRepository;
use counsel_types::billing::Subscription;
use counsel_types::file::UploadedFile;
use counsel_types::quota::Quota;
use counsel_types::user::{TierLimits, User};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Profile payload combining the account with its consumption state.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub usage: Quota,
    pub limits: TierLimits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

/// GET /api/v1/users/{id} - Profile with usage, limits, and subscription.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let ledger = state.chat_service.ledger();
    let user = ledger
        .user_repo()
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Absent quota record reads as zero usage.
    let usage = ledger
        .get_usage(&user_id)
        .await?
        .unwrap_or_else(|| Quota::zero(user_id));
    let limits = TierLimits::for_tier(user.tier);
    let subscription = state.billing_service.active_subscription(&user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        UserProfile {
            user,
            usage,
            limits,
            subscription,
        },
        request_id,
        elapsed,
    )
    .with_link("self", &format!("/api/v1/users/{user_id}"))
    .with_link("sessions", &format!("/api/v1/users/{user_id}/sessions"));
    Ok(Json(resp))
}

/// GET /api/v1/users/{id}/files - All files the user has uploaded.
pub async fn list_user_files(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<UploadedFile>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let files = state.chat_service.file_repo().list_user_files(&user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(files, request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{user_id}/files"));
    Ok(Json(resp))
}
