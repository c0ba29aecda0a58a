//! Chat session and message types.
//!
//! A session is a named, ordered conversation thread owned by one user.
//! Messages are append-only and immutable once created. Assistant messages
//! carry the external thread id that keeps the conversation threaded across
//! turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who authored a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (kind IN ('user', 'assistant', 'system'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::User => write!(f, "user"),
            MessageKind::Assistant => write!(f, "assistant"),
            MessageKind::System => write!(f, "system"),
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageKind::User),
            "assistant" => Ok(MessageKind::Assistant),
            "system" => Ok(MessageKind::System),
            other => Err(format!("invalid message kind: '{other}'")),
        }
    }
}

/// A chat session between a user and the legal assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a chat session.
///
/// Messages are ordered by `created_at` within a session. The `thread_id`
/// is the opaque continuation token of the external assistant conversation;
/// it must be passed forward on the next send to preserve multi-turn
/// coherence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub thread_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The orchestrator's result for one inbound user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub thread_id: String,
}
