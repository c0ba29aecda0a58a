//! SQLite quota repository implementation.
//!
//! The increment runs as a single `UPDATE ... SET x = x + 1` statement, so
//! concurrent increments through the serialized writer never lose updates.

use counsel_core::repository::quota::QuotaRepository;
use counsel_types::error::RepositoryError;
use counsel_types::quota::{Quota, Resource};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `QuotaRepository`.
pub struct SqliteQuotaRepository {
    pool: DatabasePool,
}

impl SqliteQuotaRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_user(
        &self,
        pool: &sqlx::SqlitePool,
        user_id: &Uuid,
    ) -> Result<Option<Quota>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM user_quotas WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let quota_row =
                    QuotaRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(quota_row.into_quota()?))
            }
            None => Ok(None),
        }
    }
}

/// Internal row type for mapping SQLite rows to domain Quota.
struct QuotaRow {
    id: String,
    user_id: String,
    messages_used: i64,
    documents_used: i64,
    reset_date: String,
    created_at: String,
    updated_at: String,
}

impl QuotaRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            messages_used: row.try_get("messages_used")?,
            documents_used: row.try_get("documents_used")?,
            reset_date: row.try_get("reset_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_quota(self) -> Result<Quota, RepositoryError> {
        Ok(Quota {
            id: parse_uuid(&self.id, "quota id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            messages_used: self.messages_used,
            documents_used: self.documents_used,
            reset_date: parse_datetime(&self.reset_date)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl QuotaRepository for SqliteQuotaRepository {
    async fn get_quota(&self, user_id: &Uuid) -> Result<Option<Quota>, RepositoryError> {
        self.fetch_by_user(&self.pool.reader, user_id).await
    }

    async fn create_quota(&self, quota: &Quota) -> Result<Quota, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_quotas (id, user_id, messages_used, documents_used, reset_date, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(quota.id.to_string())
        .bind(quota.user_id.to_string())
        .bind(quota.messages_used)
        .bind(quota.documents_used)
        .bind(format_datetime(&quota.reset_date))
        .bind(format_datetime(&quota.created_at))
        .bind(format_datetime(&quota.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(quota.clone())
    }

    async fn increment_quota(
        &self,
        user_id: &Uuid,
        resource: Resource,
    ) -> Result<Quota, RepositoryError> {
        let column = match resource {
            Resource::Messages => "messages_used",
            Resource::Documents => "documents_used",
        };

        // Atomic read-modify-write in one statement.
        let sql =
            format!("UPDATE user_quotas SET {column} = {column} + 1, updated_at = ? WHERE user_id = ?");
        let result = sqlx::query(&sql)
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        // Read back through the writer so the increment is always visible.
        self.fetch_by_user(&self.pool.writer, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn seed_user(pool: &DatabasePool) -> Uuid {
        let user_id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO users (id, email, full_name, tier, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id.to_string())
        .bind(format!("{user_id}@example.com"))
        .bind("Test User")
        .bind("free")
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
        user_id
    }

    #[tokio::test]
    async fn test_create_and_get_quota() {
        let pool = test_pool().await;
        let repo = SqliteQuotaRepository::new(pool.clone());
        let user_id = seed_user(&pool).await;

        assert!(repo.get_quota(&user_id).await.unwrap().is_none());

        let quota = Quota::zero(user_id);
        repo.create_quota(&quota).await.unwrap();

        let found = repo.get_quota(&user_id).await.unwrap().unwrap();
        assert_eq!(found.id, quota.id);
        assert_eq!(found.messages_used, 0);
        assert_eq!(found.documents_used, 0);
    }

    #[tokio::test]
    async fn test_increment_each_counter() {
        let pool = test_pool().await;
        let repo = SqliteQuotaRepository::new(pool.clone());
        let user_id = seed_user(&pool).await;
        repo.create_quota(&Quota::zero(user_id)).await.unwrap();

        let quota = repo
            .increment_quota(&user_id, Resource::Messages)
            .await
            .unwrap();
        assert_eq!(quota.messages_used, 1);
        assert_eq!(quota.documents_used, 0);

        let quota = repo
            .increment_quota(&user_id, Resource::Documents)
            .await
            .unwrap();
        assert_eq!(quota.messages_used, 1);
        assert_eq!(quota.documents_used, 1);
    }

    #[tokio::test]
    async fn test_increment_without_record() {
        let pool = test_pool().await;
        let repo = SqliteQuotaRepository::new(pool.clone());
        let user_id = seed_user(&pool).await;

        let err = repo
            .increment_quota(&user_id, Resource::Messages)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_increments_lose_nothing() {
        let pool = test_pool().await;
        let repo = std::sync::Arc::new(SqliteQuotaRepository::new(pool.clone()));
        let user_id = seed_user(&pool).await;
        repo.create_quota(&Quota::zero(user_id)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.increment_quota(&user_id, Resource::Messages).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let quota = repo.get_quota(&user_id).await.unwrap().unwrap();
        assert_eq!(quota.messages_used, 10);
    }
}
