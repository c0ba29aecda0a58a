use thiserror::Error;

use crate::quota::Resource;

/// Errors from repository operations (used by trait definitions in counsel-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the external assistant gateway.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The external run reached a terminal failure state.
    #[error("assistant run failed: {0}")]
    RunFailed(String),

    /// The run completed but the newest thread entry was not an
    /// assistant-authored text reply.
    #[error("no valid reply from assistant")]
    NoReply,

    /// The poll loop exhausted its bounded retries before the run
    /// reached a terminal state.
    #[error("assistant run timed out before reaching a terminal state")]
    Timeout,

    #[error("assistant transport error: {0}")]
    Http(String),

    #[error("assistant API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Error from the external object store.
#[derive(Debug, Error)]
#[error("object store error: {0}")]
pub struct ObjectStoreError(pub String);

/// Errors from the chat message pipeline.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("user not found")]
    UserNotFound,

    #[error("session not found")]
    SessionNotFound,

    /// Admission control denied the metered action. Callers surface this
    /// distinctly so the user can be prompted to upgrade.
    #[error("{0} limit exceeded for current tier")]
    QuotaExceeded(Resource),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from the document upload pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("user not found")]
    UserNotFound,

    #[error("{0} limit exceeded for current tier")]
    QuotaExceeded(Resource),

    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from payment initialization and callback handling.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("user not found")]
    UserNotFound,

    #[error("unknown plan: '{0}'")]
    UnknownPlan(String),

    /// The callback signature did not match; the body is not trusted and
    /// no state change is applied.
    #[error("invalid payment callback signature")]
    InvalidSignature,

    #[error("payment provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_names_resource() {
        let err = ChatError::QuotaExceeded(Resource::Messages);
        assert_eq!(err.to_string(), "messages limit exceeded for current tier");

        let err = UploadError::QuotaExceeded(Resource::Documents);
        assert_eq!(err.to_string(), "documents limit exceeded for current tier");
    }

    #[test]
    fn test_assistant_timeout_distinct_from_run_failed() {
        let timeout = AssistantError::Timeout;
        let failed = AssistantError::RunFailed("rate limited".to_string());
        assert_ne!(timeout.to_string(), failed.to_string());
        assert!(failed.to_string().contains("rate limited"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
