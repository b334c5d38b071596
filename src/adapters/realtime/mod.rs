//! Realtime notification push over WebSocket.
//!
//! ```text
//! CompletePromotionHandler ──publish──▶ RoomManager ──broadcast──▶ Room: user-42
//!                                                                  ├── tab-a
//!                                                                  └── tab-b
//! ```
//!
//! Each signed-in user gets one room; every open connection of theirs
//! receives what is published to it. Delivery is fire-and-forget: a user
//! with no open connection simply misses the push and reads the stored
//! notification later.

pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::{notifications_router, ws_handler, WebSocketState};
pub use messages::{ClientMessage, NotificationMessage, ServerMessage};
pub use rooms::{ClientId, RoomManager};
