//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle:
//! register on connect, relay every inbound frame to the other peers, and
//! deregister exactly once when either direction stops.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::api::AppState;
use crate::hub::{Broadcaster, ConnectionHandle, ConnectionId};

/// How long a closing connection may spend flushing its close frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_failed_upgrade(|e| {
        tracing::warn!(error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let relay_config = &state.config.relay;

    let (handle, mut rx) = ConnectionHandle::channel(relay_config.outbound_queue_capacity);
    let connection_id = handle.id();
    let broadcaster = Arc::clone(&state.broadcaster);

    if !broadcaster
        .registry()
        .try_add(handle, relay_config.max_connections)
        .await
    {
        tracing::warn!(
            limit = relay_config.max_connections,
            "Rejecting WebSocket connection, limit reached"
        );
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AGAIN,
                reason: Cow::from("too many connections"),
            })))
            .await;
        return;
    }

    let (mut sender, mut receiver) = socket.split();
    let (close_tx, mut close_rx) = oneshot::channel::<()>();

    // Task to forward queued messages to the socket
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                payload = rx.recv() => {
                    let Some(payload) = payload else { break };
                    if sender.send(Message::Text(payload.to_string())).await.is_err() {
                        tracing::debug!(
                            connection_id = %connection_id,
                            "WebSocket send failed, closing connection"
                        );
                        return;
                    }
                }
                _ = &mut close_rx => break,
            }
        }

        // Also flushes the reply to a client-initiated close
        let _ = sender.send(Message::Close(None)).await;
    });

    let broadcaster_for_recv = Arc::clone(&broadcaster);

    // Task to receive messages from the socket and relay them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&broadcaster_for_recv, &connection_id, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            let _ = close_tx.send(());
            if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
    }

    broadcaster.registry().remove(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    broadcaster: &Broadcaster,
    connection_id: &ConnectionId,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            broadcaster.relay_from_peer(connection_id, &text).await;
            true
        }
        Message::Binary(bytes) => {
            // Relayed as text; peers only ever receive text frames
            let text = String::from_utf8_lossy(&bytes);
            broadcaster.relay_from_peer(connection_id, &text).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Registry;

    #[tokio::test]
    async fn test_text_and_binary_are_relayed() {
        let registry = Arc::new(Registry::new());
        let (origin, mut origin_rx) = ConnectionHandle::channel(4);
        let (peer, mut peer_rx) = ConnectionHandle::channel(4);
        let origin_id = origin.id();
        registry.add(origin).await;
        registry.add(peer).await;
        let broadcaster = Broadcaster::new(registry);

        assert!(handle_ws_message(&broadcaster, &origin_id, Message::Text("hey".into())).await);
        assert!(
            handle_ws_message(&broadcaster, &origin_id, Message::Binary(b"raw".to_vec())).await
        );

        assert_eq!(&*peer_rx.try_recv().unwrap(), "hey");
        assert_eq!(&*peer_rx.try_recv().unwrap(), "raw");
        assert!(origin_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_ends_connection() {
        let broadcaster = Broadcaster::new(Arc::new(Registry::new()));
        let id = ConnectionId::new();

        assert!(!handle_ws_message(&broadcaster, &id, Message::Close(None)).await);
        assert!(handle_ws_message(&broadcaster, &id, Message::Ping(vec![1])).await);
        assert_eq!(broadcaster.stats().broadcasts, 0);
    }
}
