//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use counsel_types::error::{
    AssistantError, ChatError, PaymentError, RepositoryError, UploadError,
};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat pipeline errors.
    Chat(ChatError),
    /// Upload pipeline errors.
    Upload(UploadError),
    /// Billing errors.
    Payment(PaymentError),
    /// Direct repository errors.
    Repository(RepositoryError),
    /// Validation error.
    Validation(String),
    /// Resource not found.
    NotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        AppError::Upload(e)
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        AppError::Payment(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

/// Upstream assistant failures map to one opaque 502; the upstream detail
/// stays in the logs, not the response body.
fn assistant_response(e: &AssistantError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %e, "assistant gateway failure");
    (
        StatusCode::BAD_GATEWAY,
        "ASSISTANT_UNAVAILABLE",
        "The legal assistant is temporarily unavailable. Please try again.".to_string(),
    )
}

fn quota_response(resource: &counsel_types::quota::Resource) -> (StatusCode, &'static str, String) {
    (
        StatusCode::FORBIDDEN,
        "QUOTA_EXCEEDED",
        format!("You have reached your {resource} limit for the current plan. Upgrade to continue."),
    )
}

fn repository_response(e: &RepositoryError) -> (StatusCode, &'static str, String) {
    match e {
        RepositoryError::NotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            other.to_string(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Chat(ChatError::UserNotFound) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            AppError::Chat(ChatError::SessionNotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found".to_string(),
            ),
            AppError::Chat(ChatError::QuotaExceeded(resource)) => quota_response(resource),
            AppError::Chat(ChatError::Assistant(e)) => assistant_response(e),
            AppError::Chat(ChatError::Repository(e)) => repository_response(e),

            AppError::Upload(UploadError::UserNotFound) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            AppError::Upload(UploadError::QuotaExceeded(resource)) => quota_response(resource),
            AppError::Upload(UploadError::Assistant(e)) => assistant_response(e),
            AppError::Upload(UploadError::ObjectStore(e)) => {
                tracing::error!(error = %e, "object store failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_UNAVAILABLE",
                    "Document storage is temporarily unavailable. Please try again.".to_string(),
                )
            }
            AppError::Upload(UploadError::Repository(e)) => repository_response(e),

            AppError::Payment(PaymentError::UserNotFound) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            AppError::Payment(PaymentError::UnknownPlan(plan)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Unknown plan: '{plan}'"),
            ),
            AppError::Payment(PaymentError::InvalidSignature) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Callback signature verification failed".to_string(),
            ),
            AppError::Payment(PaymentError::Provider(e)) => {
                tracing::error!(error = %e, "payment provider failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_PROVIDER_ERROR",
                    "The payment provider is temporarily unavailable. Please try again."
                        .to_string(),
                )
            }
            AppError::Payment(PaymentError::Repository(e)) => repository_response(e),

            AppError::Repository(e) => repository_response(e),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_types::quota::Resource;

    #[test]
    fn test_quota_exceeded_is_403_with_upgrade_hint() {
        let response =
            AppError::Chat(ChatError::QuotaExceeded(Resource::Messages)).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_assistant_failure_is_502() {
        let response =
            AppError::Chat(ChatError::Assistant(AssistantError::Timeout)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let response =
            AppError::Repository(RepositoryError::Conflict("email taken".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_signature_is_401() {
        let response = AppError::Payment(PaymentError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
