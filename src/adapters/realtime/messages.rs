//! Wire protocol for the notifications socket.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::promotion::{Notification, NotificationKind};

/// Server → client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        user_id: String,
        client_id: String,
        timestamp: String,
    },
    #[serde(rename = "newNotification")]
    Notification(NotificationMessage),
    Pong {
        timestamp: String,
    },
}

/// Payload pushed for each new notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub title: String,
    pub message: String,
    #[serde(rename = "notification_type")]
    pub kind: NotificationKind,
    pub link: String,
    pub timestamp: String,
}

impl NotificationMessage {
    pub fn from_notification(notification: &Notification, at: Timestamp) -> Self {
        Self {
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind,
            link: notification.link.clone(),
            timestamp: at.to_rfc3339(),
        }
    }
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[test]
    fn notification_message_serializes_with_event_tag() {
        let notification = Notification {
            user_id: UserId::new(),
            title: "Promotion Activated".to_string(),
            message: "Your \"Basic\" promotion is now active!".to_string(),
            kind: NotificationKind::Payment,
            link: "/promote-gigs".to_string(),
        };
        let msg = ServerMessage::Notification(NotificationMessage::from_notification(
            &notification,
            Timestamp::now(),
        ));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "newNotification");
        assert_eq!(json["title"], "Promotion Activated");
        assert_eq!(json["notification_type"], "payment");
        assert_eq!(json["link"], "/promote-gigs");
    }

    #[test]
    fn ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }
}
