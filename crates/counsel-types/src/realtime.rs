//! Wire frames for the realtime WebSocket channel.
//!
//! Clients send JSON-encoded text frames matching [`ClientFrame`]; the
//! server emits [`ServerFrame`]. The first frame on any connection must be
//! `authenticate`; only then is the connection added to its session's
//! fan-out set. Typing and message frames are ephemeral: no persistence,
//! no delivery guarantee.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming frame from a WebSocket client.
///
/// Unknown or malformed frames are logged and dropped; they never
/// terminate the connection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Handshake claiming a user and session identity.
    ///
    /// The claim is not cryptographically verified; a signed session
    /// credential should replace it before exposure beyond a trusted
    /// network edge.
    Authenticate { user_id: Uuid, session_id: Uuid },
    /// Ephemeral typing indicator.
    Typing { is_typing: bool },
    /// Opaque payload relayed verbatim to every connection in the
    /// session, sender included. The server never inspects or persists
    /// the content.
    Message { message: String },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

/// Outgoing frame pushed to WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake accepted; the connection is registered for fan-out.
    Authenticated,
    /// Handshake rejected; the server closes the connection afterwards.
    AuthenticationError { error: String },
    /// Another participant's typing state, tagged with their user id.
    Typing { user_id: Uuid, is_typing: bool },
    /// Opaque payload forwarded from a participant, unchanged.
    Message { message: String },
    /// Keep-alive response.
    Pong,
}
