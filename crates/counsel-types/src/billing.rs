//! Subscription and plan pricing types for the billing upgrade path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::user::Tier;

/// Lifecycle status of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
            SubscriptionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("invalid subscription status: '{other}'")),
        }
    }
}

/// A paid subscription created on a verified payment callback.
///
/// Valid for 30 days from the callback time. `provider_reference` is the
/// payment provider's transaction reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub provider_reference: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Monthly price for a paid plan, amount in kobo (NGN minor unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrice {
    pub tier: Tier,
    pub amount_kobo: i64,
}

impl PlanPrice {
    /// Price table for the paid tiers. The free tier has no price.
    pub fn for_tier(tier: Tier) -> Option<Self> {
        match tier {
            Tier::Free => None,
            // N5,000/month
            Tier::Pro => Some(Self {
                tier,
                amount_kobo: 500_000,
            }),
            // N50,000/month
            Tier::Premium => Some(Self {
                tier,
                amount_kobo: 5_000_000,
            }),
        }
    }
}

/// Result of initializing a checkout with the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub reference: String,
    pub authorization_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_status_roundtrip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            let s = status.to_string();
            let parsed: SubscriptionStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_plan_prices() {
        assert!(PlanPrice::for_tier(Tier::Free).is_none());
        assert_eq!(PlanPrice::for_tier(Tier::Pro).unwrap().amount_kobo, 500_000);
        assert_eq!(
            PlanPrice::for_tier(Tier::Premium).unwrap().amount_kobo,
            5_000_000
        );
    }
}
