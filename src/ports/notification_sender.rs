//! Notification ports.
//!
//! Notifications are persisted for the in-app inbox and, separately,
//! pushed to any connected client of the recipient.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::promotion::Notification;

/// Durable inbox.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn save(&self, notification: &Notification) -> Result<(), DomainError>;
}

/// Live push to the recipient's room.
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Returns how many connected clients received the event.
    async fn publish(&self, notification: &Notification) -> Result<usize, DomainError>;
}
