//! User account and subscription tier types.
//!
//! A user owns zero or more chat sessions and exactly one quota record
//! (created lazily on first use). The tier determines quota limits and is
//! only ever raised through the billing upgrade path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Subscription tier of a user account.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (tier IN ('free', 'pro', 'premium'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Premium,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Pro => write!(f, "pro"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("invalid tier: '{other}'")),
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Free
    }
}

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-tier caps for the two metered resources.
///
/// A limit of `-1` denotes unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub messages: i64,
    pub documents: i64,
}

impl TierLimits {
    /// Fixed limit table: free {20, 3}, pro {500, 50}, premium unlimited.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                messages: 20,
                documents: 3,
            },
            Tier::Pro => Self {
                messages: 500,
                documents: 50,
            },
            Tier::Premium => Self {
                messages: -1,
                documents: -1,
            },
        }
    }

    /// Admission predicate: `limit == -1 || used < limit`.
    pub fn allows(used: i64, limit: i64) -> bool {
        limit == -1 || used < limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_roundtrip() {
        for tier in [Tier::Free, Tier::Pro, Tier::Premium] {
            let s = tier.to_string();
            let parsed: Tier = s.parse().unwrap();
            assert_eq!(tier, parsed);
        }
    }

    #[test]
    fn test_tier_serde() {
        let tier = Tier::Premium;
        let json = serde_json::to_string(&tier).unwrap();
        assert_eq!(json, "\"premium\"");
        let parsed: Tier = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Tier::Premium);
    }

    #[test]
    fn test_tier_default_is_free() {
        assert_eq!(Tier::default(), Tier::Free);
    }

    #[test]
    fn test_limit_table() {
        let free = TierLimits::for_tier(Tier::Free);
        assert_eq!(free.messages, 20);
        assert_eq!(free.documents, 3);

        let pro = TierLimits::for_tier(Tier::Pro);
        assert_eq!(pro.messages, 500);
        assert_eq!(pro.documents, 50);

        let premium = TierLimits::for_tier(Tier::Premium);
        assert_eq!(premium.messages, -1);
        assert_eq!(premium.documents, -1);
    }

    #[test]
    fn test_admission_predicate() {
        assert!(TierLimits::allows(19, 20));
        assert!(!TierLimits::allows(20, 20));
        assert!(!TierLimits::allows(21, 20));
        // Unlimited admits regardless of usage.
        assert!(TierLimits::allows(0, -1));
        assert!(TierLimits::allows(1_000_000, -1));
    }
}
