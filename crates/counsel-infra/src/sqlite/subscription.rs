//! SQLite subscription repository implementation.

use counsel_core::repository::subscription::SubscriptionRepository;
use counsel_types::billing::{Subscription, SubscriptionStatus};
use counsel_types::error::RepositoryError;
use counsel_types::user::Tier;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `SubscriptionRepository`.
pub struct SqliteSubscriptionRepository {
    pool: DatabasePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Subscription.
struct SubscriptionRow {
    id: String,
    user_id: String,
    tier: String,
    status: String,
    provider_reference: String,
    current_period_start: String,
    current_period_end: String,
    created_at: String,
}

impl SubscriptionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            tier: row.try_get("tier")?,
            status: row.try_get("status")?,
            provider_reference: row.try_get("provider_reference")?,
            current_period_start: row.try_get("current_period_start")?,
            current_period_end: row.try_get("current_period_end")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_subscription(self) -> Result<Subscription, RepositoryError> {
        let tier: Tier = self
            .tier
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let status: SubscriptionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Subscription {
            id: parse_uuid(&self.id, "subscription id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            tier,
            status,
            provider_reference: self.provider_reference,
            current_period_start: parse_datetime(&self.current_period_start)?,
            current_period_end: parse_datetime(&self.current_period_end)?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn create_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO subscriptions (id, user_id, tier, status, provider_reference, current_period_start, current_period_end, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(subscription.id.to_string())
        .bind(subscription.user_id.to_string())
        .bind(subscription.tier.to_string())
        .bind(subscription.status.to_string())
        .bind(&subscription.provider_reference)
        .bind(format_datetime(&subscription.current_period_start))
        .bind(format_datetime(&subscription.current_period_end))
        .bind(format_datetime(&subscription.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(subscription.clone())
    }

    async fn get_active_subscription(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT * FROM subscriptions
               WHERE user_id = ? AND status = 'active' AND current_period_end > ?
               ORDER BY current_period_end DESC LIMIT 1"#,
        )
        .bind(user_id.to_string())
        .bind(format_datetime(&chrono::Utc::now()))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let sub_row = SubscriptionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(sub_row.into_subscription()?))
            }
            None => Ok(None),
        }
    }
}
