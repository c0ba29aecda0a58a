//! FileRepository trait definition.

use counsel_types::error::RepositoryError;
use counsel_types::file::UploadedFile;
use uuid::Uuid;

/// Repository trait for uploaded-file metadata persistence.
pub trait FileRepository: Send + Sync {
    /// Create a file record.
    fn create_file(
        &self,
        file: &UploadedFile,
    ) -> impl std::future::Future<Output = Result<UploadedFile, RepositoryError>> + Send;

    /// Get a file by its unique ID.
    fn get_file(
        &self,
        file_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<UploadedFile>, RepositoryError>> + Send;

    /// List files attached to a session, newest first.
    fn list_session_files(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<UploadedFile>, RepositoryError>> + Send;

    /// List all files owned by a user, newest first.
    fn list_user_files(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<UploadedFile>, RepositoryError>> + Send;
}
