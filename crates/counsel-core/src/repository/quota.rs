//! QuotaRepository trait definition.

use counsel_types::error::RepositoryError;
use counsel_types::quota::{Quota, Resource};
use uuid::Uuid;

/// Repository trait for per-user quota persistence.
///
/// One record per user. The increment operation must be atomic at the
/// storage level (a single `UPDATE ... SET x = x + 1`) so concurrent
/// increments for the same user never lose updates.
pub trait QuotaRepository: Send + Sync {
    /// Get the quota record for a user. Absence means "never initialized".
    fn get_quota(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Quota>, RepositoryError>> + Send;

    /// Create a quota record with zero counters.
    fn create_quota(
        &self,
        quota: &Quota,
    ) -> impl std::future::Future<Output = Result<Quota, RepositoryError>> + Send;

    /// Atomically add 1 to the named counter and return the updated record.
    ///
    /// Fails with [`RepositoryError::NotFound`] if no record exists;
    /// callers are expected to lazily initialize first.
    fn increment_quota(
        &self,
        user_id: &Uuid,
        resource: Resource,
    ) -> impl std::future::Future<Output = Result<Quota, RepositoryError>> + Send;
}
