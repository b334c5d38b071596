//! WebSocket upgrade handler for the notifications socket.
//!
//! Connection lifecycle:
//! 1. Auth middleware resolves the caller (header or `?token=`)
//! 2. Upgrade to WebSocket
//! 3. Join the caller's room
//! 4. Forward room broadcasts and answer pings until disconnect
//! 5. Leave the room

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::adapters::http::middleware::RequireAuth;
use crate::domain::foundation::{Timestamp, UserId};

use super::{
    messages::{ClientMessage, ServerMessage},
    rooms::{ClientId, RoomManager},
};

#[derive(Clone)]
pub struct WebSocketState {
    pub room_manager: Arc<RoomManager>,
}

impl WebSocketState {
    pub fn new(room_manager: Arc<RoomManager>) -> Self {
        Self { room_manager }
    }
}

/// `GET /api/notifications/ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    RequireAuth(user): RequireAuth,
    State(state): State<WebSocketState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, user.id, state))
}

async fn handle_socket(socket: WebSocket, user_id: UserId, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = ClientId::new();

    let mut room_rx = state.room_manager.join(&user_id, client_id.clone()).await;

    let connected = ServerMessage::Connected {
        user_id: user_id.to_string(),
        client_id: client_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    };
    if send_message(&mut sender, &connected).await.is_err() {
        state.room_manager.leave(&client_id).await;
        return;
    }

    // Pongs are produced by the receive loop but must go out through the
    // single sink owned by the send loop.
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(8);

    let mut send_task = {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            loop {
                let outgoing = tokio::select! {
                    pushed = room_rx.recv() => match pushed {
                        Ok(notification) => ServerMessage::Notification(notification),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(client_id = %client_id, skipped, "Client lagging, notifications dropped");
                            continue;
                        }
                        Err(_) => break,
                    },
                    reply = reply_rx.recv() => match reply {
                        Some(reply) => reply,
                        None => break,
                    },
                };

                if let Err(e) = send_message(&mut sender, &outgoing).await {
                    tracing::debug!(client_id = %client_id, error = %e, "Send failed, closing connection");
                    break;
                }
            }
        })
    };

    let mut recv_task = {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Ping) => {
                            let pong = ServerMessage::Pong {
                                timestamp: Timestamp::now().to_rfc3339(),
                            };
                            if reply_tx.send(pong).await.is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            tracing::trace!(client_id = %client_id, "Ignoring unknown client message");
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(client_id = %client_id, error = %e, "Receive error");
                        break;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // The aborted task may still hold its receiver for a moment; wait for it
    // so the room is pruned correctly.
    let _ = send_task.await;
    let _ = recv_task.await;
    state.room_manager.leave(&client_id).await;
    tracing::debug!(user_id = %user_id, "Notification socket closed");
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Routes for mounting under `/api`.
pub fn notifications_router() -> Router<WebSocketState> {
    Router::new().route("/notifications/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_state_shares_room_manager() {
        let room_manager = Arc::new(RoomManager::default());
        let state = WebSocketState::new(room_manager.clone());
        assert!(Arc::ptr_eq(&state.room_manager, &room_manager));
    }

    #[test]
    fn router_builds() {
        let state = WebSocketState::new(Arc::new(RoomManager::default()));
        let _router: Router = notifications_router().with_state(state);
    }
}
