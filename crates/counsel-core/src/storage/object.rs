//! ObjectStore trait definition.
//!
//! Uploaded document bytes live in an external object store; only the
//! metadata is kept in the database. Paths follow the convention
//! `{user_id}/{session_id}/{timestamp}-{file_name}`.

use counsel_types::error::ObjectStoreError;

/// Gateway to the external object store.
pub trait ObjectStore: Send + Sync {
    /// Store bytes at `path` within `bucket`, returning the stored path.
    fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<String, ObjectStoreError>> + Send;

    /// Fetch the bytes stored at `path`.
    fn get(
        &self,
        bucket: &str,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, ObjectStoreError>> + Send;

    /// Delete the object at `path`. Deleting a missing object is a no-op.
    fn delete(
        &self,
        bucket: &str,
        path: &str,
    ) -> impl std::future::Future<Output = Result<(), ObjectStoreError>> + Send;

    /// Publicly accessible URL for the object at `path`.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
