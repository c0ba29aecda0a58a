//! SupabaseStorage -- concrete [`ObjectStore`] implementation.
//!
//! Talks to a Supabase-compatible storage API: objects live under
//! `/storage/v1/object/{bucket}/{path}` and are manipulated with the
//! service-role key. The key is wrapped in [`secrecy::SecretString`] and
//! never logged.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use counsel_core::storage::object::ObjectStore;
use counsel_types::error::ObjectStoreError;

/// HTTP client for the external object store.
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: SecretString,
}

impl SupabaseStorage {
    pub fn new(base_url: String, service_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url,
            service_key,
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ObjectStoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ObjectStoreError(format!("status {status}: {message}")));
        }
        Ok(response)
    }
}

impl ObjectStore for SupabaseStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        let response = self
            .client
            .post(self.object_url(bucket, path))
            .bearer_auth(self.service_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ObjectStoreError(e.to_string()))?;
        Self::check(response).await?;

        debug!(bucket, path, size = bytes.len(), "object stored");
        Ok(path.to_string())
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let response = self
            .client
            .get(self.object_url(bucket, path))
            .bearer_auth(self.service_key.expose_secret())
            .send()
            .await
            .map_err(|e| ObjectStoreError(e.to_string()))?;
        let response = Self::check(response).await?;

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ObjectStoreError(e.to_string()))
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), ObjectStoreError> {
        let response = self
            .client
            .delete(self.object_url(bucket, path))
            .bearer_auth(self.service_key.expose_secret())
            .send()
            .await
            .map_err(|e| ObjectStoreError(e.to_string()))?;

        // Deleting a missing object is a no-op.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}
