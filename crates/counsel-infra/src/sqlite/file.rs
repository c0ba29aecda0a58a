//! SQLite uploaded-file repository implementation.

use counsel_core::repository::file::FileRepository;
use counsel_types::error::RepositoryError;
use counsel_types::file::UploadedFile;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `FileRepository`.
pub struct SqliteFileRepository {
    pool: DatabasePool,
}

impl SqliteFileRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain UploadedFile.
struct FileRow {
    id: String,
    user_id: String,
    session_id: Option<String>,
    file_name: String,
    file_size: i64,
    content_type: String,
    storage_path: String,
    processed: i64,
    assistant_file_id: Option<String>,
    created_at: String,
}

impl FileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_id: row.try_get("session_id")?,
            file_name: row.try_get("file_name")?,
            file_size: row.try_get("file_size")?,
            content_type: row.try_get("content_type")?,
            storage_path: row.try_get("storage_path")?,
            processed: row.try_get("processed")?,
            assistant_file_id: row.try_get("assistant_file_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_file(self) -> Result<UploadedFile, RepositoryError> {
        let session_id = self
            .session_id
            .as_deref()
            .map(|s| parse_uuid(s, "session_id"))
            .transpose()?;

        Ok(UploadedFile {
            id: parse_uuid(&self.id, "file id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            session_id,
            file_name: self.file_name,
            file_size: self.file_size,
            content_type: self.content_type,
            storage_path: self.storage_path,
            processed: self.processed != 0,
            assistant_file_id: self.assistant_file_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl FileRepository for SqliteFileRepository {
    async fn create_file(&self, file: &UploadedFile) -> Result<UploadedFile, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO uploaded_files (id, user_id, session_id, file_name, file_size, content_type, storage_path, processed, assistant_file_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(file.id.to_string())
        .bind(file.user_id.to_string())
        .bind(file.session_id.map(|id| id.to_string()))
        .bind(&file.file_name)
        .bind(file.file_size)
        .bind(&file.content_type)
        .bind(&file.storage_path)
        .bind(file.processed as i64)
        .bind(&file.assistant_file_id)
        .bind(format_datetime(&file.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(file.clone())
    }

    async fn get_file(&self, file_id: &Uuid) -> Result<Option<UploadedFile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM uploaded_files WHERE id = ?")
            .bind(file_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let file_row =
                    FileRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(file_row.into_file()?))
            }
            None => Ok(None),
        }
    }

    async fn list_session_files(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<UploadedFile>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM uploaded_files WHERE session_id = ? ORDER BY created_at DESC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut files = Vec::with_capacity(rows.len());
        for row in &rows {
            let file_row =
                FileRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            files.push(file_row.into_file()?);
        }

        Ok(files)
    }

    async fn list_user_files(&self, user_id: &Uuid) -> Result<Vec<UploadedFile>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM uploaded_files WHERE user_id = ? ORDER BY created_at DESC")
                .bind(user_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut files = Vec::with_capacity(rows.len());
        for row in &rows {
            let file_row =
                FileRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            files.push(file_row.into_file()?);
        }

        Ok(files)
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

    async fn seed_user_and_session(pool: &DatabasePool) -> (Uuid, Uuid) {
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

        let session_id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id.to_string())
        .bind(user_id.to_string())
        .bind("files")
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();

        (user_id, session_id)
    }

    fn make_file(user_id: Uuid, session_id: Option<Uuid>, name: &str) -> UploadedFile {
        UploadedFile {
            id: Uuid::now_v7(),
            user_id,
            session_id,
            file_name: name.to_string(),
            file_size: 1024,
            content_type: "application/pdf".to_string(),
            storage_path: format!("{user_id}/{name}"),
            processed: true,
            assistant_file_id: Some("file-abc".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_file() {
        let pool = test_pool().await;
        let repo = SqliteFileRepository::new(pool.clone());
        let (user_id, session_id) = seed_user_and_session(&pool).await;

        let file = make_file(user_id, Some(session_id), "lease.pdf");
        repo.create_file(&file).await.unwrap();

        let found = repo.get_file(&file.id).await.unwrap().unwrap();
        assert_eq!(found.file_name, "lease.pdf");
        assert!(found.processed);
        assert_eq!(found.assistant_file_id.as_deref(), Some("file-abc"));
        assert_eq!(found.session_id, Some(session_id));
    }

    #[tokio::test]
    async fn test_list_session_files() {
        let pool = test_pool().await;
        let repo = SqliteFileRepository::new(pool.clone());
        let (user_id, session_id) = seed_user_and_session(&pool).await;

        repo.create_file(&make_file(user_id, Some(session_id), "a.pdf"))
            .await
            .unwrap();
        repo.create_file(&make_file(user_id, Some(session_id), "b.pdf"))
            .await
            .unwrap();
        // A file with no session is excluded from the session listing.
        repo.create_file(&make_file(user_id, None, "c.pdf"))
            .await
            .unwrap();

        let session_files = repo.list_session_files(&session_id).await.unwrap();
        assert_eq!(session_files.len(), 2);

        let user_files = repo.list_user_files(&user_id).await.unwrap();
        assert_eq!(user_files.len(), 3);
    }
}
