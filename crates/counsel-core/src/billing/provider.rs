//! PaymentProvider trait definition.

use counsel_types::billing::CheckoutSession;
use counsel_types::error::PaymentError;
use counsel_types::user::Tier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to a checkout so the asynchronous callback can be
/// mapped back to the purchasing user and the plan they paid for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    pub user_id: Uuid,
    pub plan: Tier,
}

/// Gateway to the external payment provider.
///
/// The concrete implementation lives in counsel-infra. Checkout runs
/// redirect-style: `initialize` returns a hosted payment URL, and the
/// provider later confirms the charge through a signed server-to-server
/// callback.
pub trait PaymentProvider: Send + Sync {
    /// Start a checkout for `amount_kobo` billed to `email`, carrying
    /// `metadata` through to the eventual callback.
    fn initialize(
        &self,
        email: &str,
        amount_kobo: i64,
        metadata: &CheckoutMetadata,
    ) -> impl std::future::Future<Output = Result<CheckoutSession, PaymentError>> + Send;

    /// Verify that `signature` authenticates `body` as originating from
    /// the provider. Callbacks failing this check must not change state.
    fn verify_signature(&self, body: &[u8], signature: &str) -> bool;
}
