//! Per-user broadcast rooms.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::promotion::Notification;
use crate::ports::RealtimePublisher;

use super::messages::NotificationMessage;

/// Identifies one socket connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Routes notifications to the connections of the user they belong to.
///
/// Broadcasts far outnumber joins and leaves, so the registry sits behind
/// an `RwLock`.
pub struct RoomManager {
    rooms: RwLock<HashMap<UserId, broadcast::Sender<NotificationMessage>>>,
    /// client → user, for cleanup on disconnect.
    clients: RwLock<HashMap<ClientId, UserId>>,
    channel_capacity: usize,
}

impl RoomManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            clients: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(64)
    }

    /// Adds a connection to the user's room, creating the room if needed.
    pub async fn join(
        &self,
        user_id: &UserId,
        client_id: ClientId,
    ) -> broadcast::Receiver<NotificationMessage> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms.entry(*user_id).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        self.clients.write().await.insert(client_id, *user_id);

        sender.subscribe()
    }

    /// Removes a connection. The room goes away with its last receiver.
    pub async fn leave(&self, client_id: &ClientId) {
        let Some(user_id) = self.clients.write().await.remove(client_id) else {
            return;
        };

        let mut rooms = self.rooms.write().await;
        if rooms
            .get(&user_id)
            .map_or(false, |sender| sender.receiver_count() == 0)
        {
            rooms.remove(&user_id);
        }
    }

    /// Sends to every connection of `user_id`. Returns how many received it.
    pub async fn send_to_user(&self, user_id: &UserId, message: NotificationMessage) -> usize {
        let rooms = self.rooms.read().await;
        match rooms.get(user_id) {
            // Err only means nobody is listening.
            Some(sender) => sender.send(message).unwrap_or(0),
            None => 0,
        }
    }

    pub async fn client_count(&self, user_id: &UserId) -> usize {
        self.rooms
            .read()
            .await
            .get(user_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    pub async fn total_client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl RealtimePublisher for RoomManager {
    async fn publish(&self, notification: &Notification) -> Result<usize, DomainError> {
        let message = NotificationMessage::from_notification(notification, Timestamp::now());
        let delivered = self.send_to_user(&notification.user_id, message).await;
        tracing::debug!(
            user_id = %notification.user_id,
            delivered,
            "Realtime notification published"
        );
        Ok(delivered)
    }
}
