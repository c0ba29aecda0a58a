//! UserRepository trait definition.

use counsel_types::error::RepositoryError;
use counsel_types::user::{Tier, User};
use uuid::Uuid;

/// Repository trait for user account persistence.
///
/// Email uniqueness is enforced by the backend (unique index); a duplicate
/// create surfaces as [`RepositoryError::Conflict`].
pub trait UserRepository: Send + Sync {
    /// Create a new user.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by its unique ID.
    fn get_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by email address.
    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Update a user's tier, bumping `updated_at`.
    fn update_tier(
        &self,
        user_id: &Uuid,
        tier: Tier,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
