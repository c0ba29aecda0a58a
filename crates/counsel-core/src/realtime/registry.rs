//! Session connection registry.
//!
//! Maps a session id to the set of currently open connections for that
//! session (the "bucket"). Many connections may share one session --
//! multiple tabs for the same user are normal. A registration is valid
//! only while the underlying socket stays open; the transport layer
//! unregisters on every disconnect path.
//!
//! The registry is an explicitly constructed instance injected through
//! application state, not a global. All operations are safe under
//! concurrent connect/disconnect churn: a broadcast iterating a bucket
//! skips connections whose channel has closed mid-iteration and continues.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use counsel_types::realtime::ServerFrame;

/// Opaque identifier for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One registered connection: the claimed user identity plus the sending
/// half of the channel bridging the registry to the socket task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: Uuid,
    sender: mpsc::UnboundedSender<ServerFrame>,
}

impl ConnectionHandle {
    /// Create a handle plus the receiving half the socket task drains.
    pub fn new(user_id: Uuid) -> (Self, mpsc::UnboundedReceiver<ServerFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId::new(),
                user_id,
                sender,
            },
            receiver,
        )
    }

    /// Best-effort send. Returns false when the receiving side is gone
    /// (the socket closed); callers skip and continue.
    pub fn send(&self, frame: ServerFrame) -> bool {
        self.sender.send(frame).is_ok()
    }

    /// Whether the connection's channel is still open.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Per-session fan-out sets for all live connections in this process.
#[derive(Default)]
pub struct SessionRegistry {
    buckets: DashMap<Uuid, Vec<ConnectionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the session's bucket, creating the bucket if
    /// absent. Called only after a successful authenticate handshake.
    pub fn register(&self, session_id: Uuid, handle: ConnectionHandle) {
        debug!(%session_id, connection_id = %handle.id, user_id = %handle.user_id, "connection registered");
        self.buckets.entry(session_id).or_default().push(handle);
    }

    /// Remove a connection from its session bucket, deleting the bucket
    /// when it empties. Idempotent: unregistering twice, or a connection
    /// that was never registered, is a no-op.
    pub fn unregister(&self, session_id: &Uuid, connection_id: ConnectionId) {
        let emptied = match self.buckets.get_mut(session_id) {
            Some(mut bucket) => {
                bucket.retain(|h| h.id != connection_id);
                bucket.is_empty()
            }
            None => return,
        };
        if emptied {
            self.buckets.remove_if(session_id, |_, bucket| bucket.is_empty());
            debug!(%session_id, "session bucket emptied");
        }
    }

    /// Send a frame to every open connection in the session's bucket,
    /// except `exclude`. Closed connections are skipped silently -- no
    /// error, no retry. Broadcasting to a missing bucket is a no-op.
    ///
    /// Returns the number of connections the frame was handed to.
    pub fn broadcast(
        &self,
        session_id: &Uuid,
        frame: ServerFrame,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let Some(bucket) = self.buckets.get(session_id) else {
            return 0;
        };

        let mut delivered = 0;
        for handle in bucket.iter() {
            if Some(handle.id) == exclude {
                continue;
            }
            if handle.send(frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Send a frame to every open connection authenticated as `user_id`,
    /// across all sessions. Best effort, no delivery confirmation.
    pub fn send_to_user(&self, user_id: &Uuid, frame: ServerFrame) -> usize {
        let mut delivered = 0;
        for bucket in self.buckets.iter() {
            for handle in bucket.iter() {
                if handle.user_id == *user_id && handle.send(frame.clone()) {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Number of sessions with at least one registered connection.
    pub fn session_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total registered connections across all sessions.
    pub fn connection_count(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}
