//! SubscriptionRepository trait definition.

use counsel_types::billing::Subscription;
use counsel_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for subscription record persistence.
pub trait SubscriptionRepository: Send + Sync {
    /// Create a subscription record.
    fn create_subscription(
        &self,
        subscription: &Subscription,
    ) -> impl std::future::Future<Output = Result<Subscription, RepositoryError>> + Send;

    /// Get the user's currently active subscription, if any: status is
    /// `active` and the period end lies in the future.
    fn get_active_subscription(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Subscription>, RepositoryError>> + Send;
}
