//! Document upload handler.
//!
//! POST /api/v1/documents/upload accepts a multipart form with `user_id`,
//! `session_id`, and a `file` part. The whole file is buffered before the
//! pipeline runs; oversized bodies are rejected by the extractor's limit.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use uuid::Uuid;

use counsel_types::file::UploadedFile;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

struct UploadForm {
    user_id: Uuid,
    session_id: Uuid,
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut user_id = None;
    let mut session_id = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable user_id: {e}")))?;
                user_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| AppError::Validation("user_id is not a UUID".to_string()))?,
                );
            }
            Some("session_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable session_id: {e}")))?;
                session_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| AppError::Validation("session_id is not a UUID".to_string()))?,
                );
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("document")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file body: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::Validation("user_id field is required".to_string()))?;
    let session_id = session_id
        .ok_or_else(|| AppError::Validation("session_id field is required".to_string()))?;
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("file is empty".to_string()));
    }

    Ok(UploadForm {
        user_id,
        session_id,
        file_name,
        content_type,
        bytes,
    })
}

/// POST /api/v1/documents/upload - Store, index, and record a document.
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadedFile>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let form = read_form(multipart).await?;

    let file = state
        .chat_service
        .upload_document(
            form.user_id,
            form.session_id,
            &form.file_name,
            &form.content_type,
            &form.bytes,
        )
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(file, request_id, elapsed).with_link(
        "files",
        &format!("/api/v1/users/{}/files", form.user_id),
    );
    Ok(Json(resp))
}
