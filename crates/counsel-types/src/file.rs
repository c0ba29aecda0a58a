//! Uploaded document metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for a document uploaded for legal analysis.
///
/// The bytes themselves live in the object store at `storage_path`
/// (`{user_id}/{session_id}/{timestamp}-{file_name}`). `processed` flips to
/// true only once the assistant gateway has accepted the content;
/// `assistant_file_id` is the external reference attached to subsequent
/// chat turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub storage_path: String,
    pub processed: bool,
    pub assistant_file_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_file_serialize() {
        let file = UploadedFile {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            session_id: None,
            file_name: "lease-agreement.pdf".to_string(),
            file_size: 48_213,
            content_type: "application/pdf".to_string(),
            storage_path: "u/s/1-lease-agreement.pdf".to_string(),
            processed: false,
            assistant_file_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"processed\":false"));
        assert!(json.contains("lease-agreement.pdf"));
    }
}
