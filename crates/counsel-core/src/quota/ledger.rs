//! Quota ledger: admission control and atomic usage increments.
//!
//! Tracks per-user consumption of the two metered resources (messages,
//! document uploads) against tier-defined limits. The ledger is advisory:
//! it answers admission questions and performs increments, but never
//! denies an increment itself -- callers run `check_admission` before the
//! operation that consumes quota.
//!
//! `check_admission` followed by `increment` is a check-then-act pair with
//! no intervening lock. Two concurrent sends at `used == limit - 1` can
//! both pass admission and both increment, exceeding the nominal cap by
//! one per concurrent sender. The increment itself is atomic at the
//! storage level, so counters never lose updates.

use counsel_types::error::RepositoryError;
use counsel_types::quota::{Quota, Resource};
use counsel_types::user::TierLimits;
use tracing::debug;
use uuid::Uuid;

use crate::repository::quota::QuotaRepository;
use crate::repository::user::UserRepository;

/// Admission control and usage accounting for one process.
///
/// Generic over `QuotaRepository` and `UserRepository` to maintain clean
/// architecture (counsel-core never depends on counsel-infra).
pub struct QuotaLedger<Q: QuotaRepository, U: UserRepository> {
    quota_repo: Q,
    user_repo: U,
}

impl<Q: QuotaRepository, U: UserRepository> QuotaLedger<Q, U> {
    /// Create a new ledger with the given repositories.
    pub fn new(quota_repo: Q, user_repo: U) -> Self {
        Self {
            quota_repo,
            user_repo,
        }
    }

    /// Access the quota repository.
    pub fn quota_repo(&self) -> &Q {
        &self.quota_repo
    }

    /// Access the user repository.
    pub fn user_repo(&self) -> &U {
        &self.user_repo
    }

    /// Get the user's quota record. Absence means "never initialized" and
    /// is not an error.
    pub async fn get_usage(&self, user_id: &Uuid) -> Result<Option<Quota>, RepositoryError> {
        self.quota_repo.get_quota(user_id).await
    }

    /// Idempotently create the user's quota record with zero counters.
    pub async fn ensure_usage(&self, user_id: &Uuid) -> Result<Quota, RepositoryError> {
        if let Some(quota) = self.quota_repo.get_quota(user_id).await? {
            return Ok(quota);
        }
        self.quota_repo.create_quota(&Quota::zero(*user_id)).await
    }

    /// True iff the user may consume one more unit of `resource`.
    ///
    /// Reads the user's *current* tier on every call: upgrades change the
    /// limit without resetting counters, so a cached tier would deny or
    /// admit incorrectly. A missing quota record counts as zero usage.
    pub async fn check_admission(
        &self,
        user_id: &Uuid,
        resource: Resource,
    ) -> Result<bool, RepositoryError> {
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let limits = TierLimits::for_tier(user.tier);
        let limit = match resource {
            Resource::Messages => limits.messages,
            Resource::Documents => limits.documents,
        };

        let used = self
            .quota_repo
            .get_quota(user_id)
            .await?
            .map(|q| q.used(resource))
            .unwrap_or(0);

        let admitted = TierLimits::allows(used, limit);
        debug!(%user_id, %resource, used, limit, admitted, "admission check");
        Ok(admitted)
    }

    /// Add 1 to the named counter, lazily initializing the record first.
    ///
    /// Incrementing for a user with no quota record is not an error: the
    /// record is created with zero counters, then incremented to 1.
    pub async fn increment(
        &self,
        user_id: &Uuid,
        resource: Resource,
    ) -> Result<Quota, RepositoryError> {
        if self.quota_repo.get_quota(user_id).await?.is_none() {
            self.quota_repo.create_quota(&Quota::zero(*user_id)).await?;
        }
        self.quota_repo.increment_quota(user_id, resource).await
    }
}
