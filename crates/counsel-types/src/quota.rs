//! Per-user usage quota types.
//!
//! One quota record per user, created lazily on first use. The two counters
//! only ever increase (by exactly 1 per successful chat send or document
//! upload). `reset_date` is recorded at creation but no scheduler acts on
//! it; resets are a manual operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// The two metered resources gated by admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Messages,
    Documents,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Messages => write!(f, "messages"),
            Resource::Documents => write!(f, "documents"),
        }
    }
}

/// Consumption counters for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quota {
    pub id: Uuid,
    pub user_id: Uuid,
    pub messages_used: i64,
    pub documents_used: i64,
    pub reset_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quota {
    /// A zeroed quota record for a user, used for lazy initialization.
    pub fn zero(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            messages_used: 0,
            documents_used: 0,
            reset_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// The counter for the given resource.
    pub fn used(&self, resource: Resource) -> i64 {
        match resource {
            Resource::Messages => self.messages_used,
            Resource::Documents => self.documents_used,
        }
    }
}
