//! Billing service: tier upgrades through the payment provider.
//!
//! Upgrades are asynchronous: `initialize_upgrade` starts a hosted
//! checkout, and the tier change only lands when the provider's signed
//! callback arrives at `apply_callback`. An unverified callback changes
//! nothing.

use chrono::{Duration, Utc};
use counsel_types::billing::{CheckoutSession, PlanPrice, Subscription, SubscriptionStatus};
use counsel_types::error::PaymentError;
use counsel_types::user::Tier;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::repository::subscription::SubscriptionRepository;
use crate::repository::user::UserRepository;

use super::provider::{CheckoutMetadata, PaymentProvider};

/// Subscription period granted per successful charge.
const PERIOD_DAYS: i64 = 30;

/// Provider callback body. Only `charge.success` events are acted on.
#[derive(Debug, Deserialize)]
struct CallbackPayload {
    event: String,
    data: CallbackData,
}

#[derive(Debug, Deserialize)]
struct CallbackData {
    reference: String,
    metadata: CheckoutMetadata,
}

/// Orchestrates checkout initialization and callback settlement.
pub struct BillingService<P, S, U>
where
    P: PaymentProvider,
    S: SubscriptionRepository,
    U: UserRepository,
{
    provider: P,
    subscription_repo: S,
    user_repo: U,
}

impl<P, S, U> BillingService<P, S, U>
where
    P: PaymentProvider,
    S: SubscriptionRepository,
    U: UserRepository,
{
    pub fn new(provider: P, subscription_repo: S, user_repo: U) -> Self {
        Self {
            provider,
            subscription_repo,
            user_repo,
        }
    }

    /// Start a checkout upgrading `user_id` to `plan`.
    ///
    /// The free tier has no price and cannot be checked out.
    pub async fn initialize_upgrade(
        &self,
        user_id: Uuid,
        plan: Tier,
    ) -> Result<CheckoutSession, PaymentError> {
        let user = self
            .user_repo
            .get_user(&user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)?;

        let price =
            PlanPrice::for_tier(plan).ok_or_else(|| PaymentError::UnknownPlan(plan.to_string()))?;

        let metadata = CheckoutMetadata { user_id, plan };
        let checkout = self
            .provider
            .initialize(&user.email, price.amount_kobo, &metadata)
            .await?;
        info!(%user_id, %plan, reference = %checkout.reference, "checkout initialized");
        Ok(checkout)
    }

    /// Settle a provider callback.
    ///
    /// The signature is verified against the raw body before anything is
    /// parsed; a mismatch rejects the callback with no state change.
    /// Events other than `charge.success` are acknowledged and ignored.
    /// On success the user's tier is raised and a subscription record
    /// covering the next period is created.
    pub async fn apply_callback(
        &self,
        body: &[u8],
        signature: &str,
    ) -> Result<Option<Subscription>, PaymentError> {
        if !self.provider.verify_signature(body, signature) {
            warn!("payment callback rejected: signature mismatch");
            return Err(PaymentError::InvalidSignature);
        }

        let payload: CallbackPayload = serde_json::from_slice(body)
            .map_err(|e| PaymentError::Provider(format!("malformed callback body: {e}")))?;

        if payload.event != "charge.success" {
            return Ok(None);
        }

        let CheckoutMetadata { user_id, plan } = payload.data.metadata;
        if PlanPrice::for_tier(plan).is_none() {
            return Err(PaymentError::UnknownPlan(plan.to_string()));
        }

        self.user_repo
            .get_user(&user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)?;

        self.user_repo.update_tier(&user_id, plan).await?;

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::now_v7(),
            user_id,
            tier: plan,
            status: SubscriptionStatus::Active,
            provider_reference: payload.data.reference,
            current_period_start: now,
            current_period_end: now + Duration::days(PERIOD_DAYS),
            created_at: now,
        };
        let subscription = self.subscription_repo.create_subscription(&subscription).await?;
        info!(%user_id, %plan, reference = %subscription.provider_reference, "subscription settled");
        Ok(Some(subscription))
    }

    /// The user's currently active subscription, if any.
    pub async fn active_subscription(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<Subscription>, PaymentError> {
        Ok(self
            .subscription_repo
            .get_active_subscription(user_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_types::error::RepositoryError;
    use counsel_types::user::User;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryUserRepo {
        users: Mutex<HashMap<Uuid, User>>,
    }

    impl UserRepository for MemoryUserRepo {
        async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
            self.users.lock().unwrap().insert(user.id, user.clone());
            Ok(user.clone())
        }

        async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.lock().unwrap().get(user_id).cloned())
        }

        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn update_tier(&self, user_id: &Uuid, tier: Tier) -> Result<(), RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
            user.tier = tier;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySubscriptionRepo {
        subscriptions: Mutex<Vec<Subscription>>,
    }

    impl SubscriptionRepository for MemorySubscriptionRepo {
        async fn create_subscription(
            &self,
            subscription: &Subscription,
        ) -> Result<Subscription, RepositoryError> {
            self.subscriptions
                .lock()
                .unwrap()
                .push(subscription.clone());
            Ok(subscription.clone())
        }

        async fn get_active_subscription(
            &self,
            user_id: &Uuid,
        ) -> Result<Option<Subscription>, RepositoryError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .find(|s| {
                    s.user_id == *user_id
                        && s.status == SubscriptionStatus::Active
                        && s.current_period_end > Utc::now()
                })
                .cloned())
        }
    }

    /// Provider double: accepts exactly the signature "valid".
    struct MockProvider;

    impl PaymentProvider for MockProvider {
        async fn initialize(
            &self,
            email: &str,
            amount_kobo: i64,
            _metadata: &CheckoutMetadata,
        ) -> Result<CheckoutSession, PaymentError> {
            Ok(CheckoutSession {
                reference: format!("ref-{amount_kobo}-{email}"),
                authorization_url: "https://checkout.test/abc".to_string(),
            })
        }

        fn verify_signature(&self, _body: &[u8], signature: &str) -> bool {
            signature == "valid"
        }
    }

    fn service_with_user(
        tier: Tier,
    ) -> (
        BillingService<MockProvider, MemorySubscriptionRepo, MemoryUserRepo>,
        Uuid,
    ) {
        let user = User {
            id: Uuid::now_v7(),
            email: "ada@example.com".to_string(),
            full_name: "Ada Obi".to_string(),
            tier,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user_id = user.id;
        let user_repo = MemoryUserRepo {
            users: Mutex::new(HashMap::from([(user_id, user)])),
        };
        (
            BillingService::new(MockProvider, MemorySubscriptionRepo::default(), user_repo),
            user_id,
        )
    }

    fn success_body(user_id: Uuid, plan: &str, reference: &str) -> Vec<u8> {
        serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": reference,
                "metadata": { "user_id": user_id, "plan": plan }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_initialize_returns_checkout() {
        let (service, user_id) = service_with_user(Tier::Free);
        let checkout = service.initialize_upgrade(user_id, Tier::Pro).await.unwrap();
        assert!(checkout.reference.contains("500000"));
        assert!(!checkout.authorization_url.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_rejects_free_plan() {
        let (service, user_id) = service_with_user(Tier::Free);
        let err = service
            .initialize_upgrade(user_id, Tier::Free)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::UnknownPlan(_)));
    }

    #[tokio::test]
    async fn test_initialize_unknown_user() {
        let (service, _user_id) = service_with_user(Tier::Free);
        let err = service
            .initialize_upgrade(Uuid::now_v7(), Tier::Pro)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::UserNotFound));
    }

    #[tokio::test]
    async fn test_callback_settles_upgrade() {
        let (service, user_id) = service_with_user(Tier::Free);
        let body = success_body(user_id, "pro", "ref-1");

        let subscription = service
            .apply_callback(&body, "valid")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(subscription.tier, Tier::Pro);
        assert_eq!(subscription.provider_reference, "ref-1");
        assert_eq!(
            (subscription.current_period_end - subscription.current_period_start).num_days(),
            30
        );

        let user = service.user_repo.get_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.tier, Tier::Pro);
        assert!(service
            .active_subscription(&user_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_bad_signature_changes_nothing() {
        let (service, user_id) = service_with_user(Tier::Free);
        let body = success_body(user_id, "premium", "ref-2");

        let err = service.apply_callback(&body, "forged").await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature));

        let user = service.user_repo.get_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.tier, Tier::Free);
        assert!(service
            .active_subscription(&user_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_non_success_event_ignored() {
        let (service, user_id) = service_with_user(Tier::Free);
        let body = serde_json::json!({
            "event": "charge.dispute.create",
            "data": {
                "reference": "ref-3",
                "metadata": { "user_id": user_id, "plan": "pro" }
            }
        })
        .to_string()
        .into_bytes();

        let settled = service.apply_callback(&body, "valid").await.unwrap();
        assert!(settled.is_none());

        let user = service.user_repo.get_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.tier, Tier::Free);
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let (service, _user_id) = service_with_user(Tier::Free);
        let err = service
            .apply_callback(b"not json", "valid")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Provider(_)));
    }

    #[tokio::test]
    async fn test_free_plan_in_callback_rejected() {
        let (service, user_id) = service_with_user(Tier::Free);
        let body = success_body(user_id, "free", "ref-4");
        let err = service.apply_callback(&body, "valid").await.unwrap_err();
        assert!(matches!(err, PaymentError::UnknownPlan(_)));
    }
}
