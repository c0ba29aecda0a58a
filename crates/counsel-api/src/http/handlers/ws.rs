//! WebSocket handler for the realtime session channel.
//!
//! The `/ws` endpoint upgrades an HTTP connection to a WebSocket. The
//! first text frame must be an `authenticate` [`ClientFrame`] naming a
//! user and session; anything else gets an `authentication_error` frame
//! and the connection is closed. Once authenticated the connection is
//! registered in the [`SessionRegistry`] and stays registered until the
//! socket closes, on every exit path.
//!
//! Typing frames fan out to the other connections in the same session
//! through the [`SignalRelay`]; opaque message frames fan out to the
//! whole session, sender included. Unknown or malformed frames after the
//! handshake are logged and dropped; they never terminate the connection.
//!
//! [`SessionRegistry`]: counsel_core::realtime::SessionRegistry
//! [`SignalRelay`]: counsel_core::realtime::SignalRelay

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use counsel_core::realtime::ConnectionHandle;
use counsel_types::realtime::{ClientFrame, ServerFrame};

use crate::state::AppState;

/// Upgrade an HTTP request to the realtime WebSocket channel.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Handshake: the first text frame must authenticate the connection.
    let (user_id, session_id) = match read_handshake(&mut ws_receiver).await {
        Ok(identity) => identity,
        Err(reason) => {
            let frame = ServerFrame::AuthenticationError { error: reason };
            if let Ok(json) = serde_json::to_string(&frame) {
                let _ = ws_sender.send(Message::Text(json.into())).await;
            }
            let _ = ws_sender.close().await;
            return;
        }
    };

    let (handle, mut frame_rx) = ConnectionHandle::new(user_id);
    let connection_id = handle.id;
    state.registry.register(session_id, handle);
    tracing::debug!(%session_id, %user_id, %connection_id, "websocket authenticated");

    if send_frame(&mut ws_sender, &ServerFrame::Authenticated)
        .await
        .is_err()
    {
        state.registry.unregister(&session_id, connection_id);
        return;
    }

    loop {
        tokio::select! {
            // --- Branch 1: Forward registry frames to the client ---
            frame = frame_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if send_frame(&mut ws_sender, &frame).await.is_err() {
                            break;
                        }
                    }
                    // All handle clones dropped; nothing more will arrive.
                    None => break,
                }
            }

            // --- Branch 2: Process frames from the client ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        process_frame(
                            &text,
                            &mut ws_sender,
                            &state,
                            &session_id,
                            connection_id,
                            user_id,
                        ).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!("websocket receive error: {err}");
                        break;
                    }
                    // Binary, ping, pong protocol frames are handled by axum.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.registry.unregister(&session_id, connection_id);
    tracing::debug!(%session_id, %connection_id, "websocket connection closed");
}

/// Read frames until the first text frame and parse it as the
/// authenticate handshake.
async fn read_handshake(
    ws_receiver: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
) -> Result<(Uuid, Uuid), String> {
    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                return match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Authenticate { user_id, session_id }) => {
                        Ok((user_id, session_id))
                    }
                    Ok(_) => Err("First frame must be authenticate".to_string()),
                    Err(err) => Err(format!("Malformed authenticate frame: {err}")),
                };
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err("Connection closed before handshake".to_string());
            }
            Some(Err(err)) => {
                return Err(format!("Receive error before handshake: {err}"));
            }
            Some(Ok(_)) => {}
        }
    }
}

async fn send_frame(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(json) => ws_sender.send(Message::Text(json.into())).await,
        Err(err) => {
            tracing::warn!("failed to serialize server frame: {err}");
            Ok(())
        }
    }
}

/// Parse and process one post-handshake frame from the client.
async fn process_frame(
    text: &str,
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    state: &AppState,
    session_id: &Uuid,
    connection_id: counsel_core::realtime::ConnectionId,
    user_id: Uuid,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(raw = %text, error = %err, "ignoring malformed client frame");
            return;
        }
    };

    match frame {
        ClientFrame::Authenticate { .. } => {
            // Re-authentication is not supported; the claim is fixed at
            // handshake time.
            tracing::warn!(%connection_id, "ignoring repeated authenticate frame");
        }
        ClientFrame::Typing { is_typing } => {
            state
                .relay
                .relay_typing(session_id, connection_id, user_id, is_typing);
        }
        ClientFrame::Message { message } => {
            state.relay.relay_message(session_id, message);
        }
        ClientFrame::Ping => {
            if send_frame(ws_sender, &ServerFrame::Pong).await.is_err() {
                tracing::debug!("failed to send pong (client disconnecting)");
            }
        }
    }
}
