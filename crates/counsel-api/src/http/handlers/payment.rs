//! Payment handlers.
//!
//! Endpoints:
//! - POST /api/v1/payments/initialize - Start a checkout for a plan upgrade
//! - POST /api/v1/payments/callback   - Provider webhook (signature-gated)

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use counsel_types::billing::CheckoutSession;
use counsel_types::user::Tier;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub user_id: Uuid,
    pub plan: Tier,
}

/// POST /api/v1/payments/initialize - Create a checkout session.
pub async fn initialize(
    State(state): State<AppState>,
    Json(body): Json<InitializeRequest>,
) -> Result<Json<ApiResponse<CheckoutSession>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .billing_service
        .initialize_upgrade(body.user_id, body.plan)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(session, request_id, elapsed);
    Ok(Json(resp))
}

/// POST /api/v1/payments/callback - Provider webhook.
///
/// The signature covers the raw body, so the body must not be
/// deserialized before verification. Events other than a successful
/// charge are acknowledged with 200 and ignored; the provider retries
/// anything else.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let settled = state.billing_service.apply_callback(&body, signature).await?;

    let payload = match settled {
        Some(subscription) => {
            tracing::info!(
                user_id = %subscription.user_id,
                tier = %subscription.tier,
                "subscription settled"
            );
            json!({ "status": "processed", "subscription": subscription })
        }
        None => json!({ "status": "ignored" }),
    };

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(payload, request_id, elapsed);
    Ok(Json(resp))
}
