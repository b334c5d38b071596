//! Recording notification adapters.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::promotion::Notification;
use crate::ports::{NotificationStore, RealtimePublisher};

/// Inbox that keeps notifications in memory.
pub struct InMemoryNotificationStore {
    saved: RwLock<Vec<Notification>>,
    fail: AtomicBool,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self {
            saved: RwLock::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn saved(&self) -> Vec<Notification> {
        self.saved
            .read()
            .expect("InMemoryNotificationStore: lock poisoned")
            .clone()
    }

    /// Makes every later save fail.
    pub fn fail_saves(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn save(&self, notification: &Notification) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::new(ErrorCode::DatabaseError, "notification store offline"));
        }
        self.saved
            .write()
            .expect("InMemoryNotificationStore: lock poisoned")
            .push(notification.clone());
        Ok(())
    }
}

/// Publisher that records what would have been pushed.
pub struct InMemoryRealtimePublisher {
    published: RwLock<Vec<Notification>>,
}

impl InMemoryRealtimePublisher {
    pub fn new() -> Self {
        Self {
            published: RwLock::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<Notification> {
        self.published
            .read()
            .expect("InMemoryRealtimePublisher: lock poisoned")
            .clone()
    }
}

impl Default for InMemoryRealtimePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimePublisher for InMemoryRealtimePublisher {
    async fn publish(&self, notification: &Notification) -> Result<usize, DomainError> {
        self.published
            .write()
            .expect("InMemoryRealtimePublisher: lock poisoned")
            .push(notification.clone());
        Ok(1)
    }
}
