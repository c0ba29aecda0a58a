//! SQLite implementations of the `counsel-core` repository traits.
//!
//! All repositories share a [`pool::DatabasePool`] with split reader/writer
//! connections in WAL mode, and map rows through private `*Row` structs.

pub mod chat;
pub mod file;
pub mod pool;
pub mod quota;
pub mod subscription;
pub mod user;

pub use chat::SqliteChatRepository;
pub use file::SqliteFileRepository;
pub use pool::DatabasePool;
pub use quota::SqliteQuotaRepository;
pub use subscription::SqliteSubscriptionRepository;
pub use user::SqliteUserRepository;

use chrono::{DateTime, Utc};
use counsel_types::error::RepositoryError;

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn parse_uuid(s: &str, field: &str) -> Result<uuid::Uuid, RepositoryError> {
    uuid::Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {field}: {e}")))
}
