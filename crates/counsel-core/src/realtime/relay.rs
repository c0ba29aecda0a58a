//! Ephemeral signal relay.
//!
//! Consumes the [`SessionRegistry`] to push ephemeral events between the
//! connections of a session: typing state goes to every connection except
//! the sender, opaque message frames go to the whole bucket, sender
//! included. No persistence, no acknowledgment; connections see events in
//! the order the relay processed them, nothing stronger.

use std::sync::Arc;

use tracing::trace;
use uuid::Uuid;

use counsel_types::realtime::ServerFrame;

use super::registry::{ConnectionId, SessionRegistry};

/// Fan-out of ephemeral frames within a session.
#[derive(Clone)]
pub struct SignalRelay {
    registry: Arc<SessionRegistry>,
}

impl SignalRelay {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Relay a typing state change from an authenticated connection to
    /// every other connection in the same session, tagged with the
    /// sender's claimed user id.
    pub fn relay_typing(
        &self,
        session_id: &Uuid,
        sender_connection: ConnectionId,
        sender_user: Uuid,
        is_typing: bool,
    ) -> usize {
        let delivered = self.registry.broadcast(
            session_id,
            ServerFrame::Typing {
                user_id: sender_user,
                is_typing,
            },
            Some(sender_connection),
        );
        trace!(%session_id, %sender_user, is_typing, delivered, "typing relayed");
        delivered
    }

    /// Relay an opaque message frame to every connection in the session,
    /// sender included. The payload is forwarded verbatim, never
    /// inspected or stored.
    pub fn relay_message(&self, session_id: &Uuid, message: String) -> usize {
        let delivered = self
            .registry
            .broadcast(session_id, ServerFrame::Message { message }, None);
        trace!(%session_id, delivered, "message relayed");
        delivered
    }
}
