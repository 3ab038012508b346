//! Room fan-out for chat messages.

use eventmingle_core::entities::Message as ChatMessage;
use eventmingle_web::TopicBroadcaster;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A stored message on its way to a room.
#[derive(Debug, Clone)]
pub struct RoomFrame {
    /// Connection that sent it, if it came from a socket.
    pub origin: Option<Uuid>,
    /// The stored message.
    pub message: ChatMessage,
}

/// Chat rooms keyed by chat id.
#[derive(Debug, Clone)]
pub struct ChatHub {
    rooms: TopicBroadcaster<RoomFrame>,
}

impl ChatHub {
    /// Create a hub; each room buffers `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: TopicBroadcaster::new(capacity),
        }
    }

    /// Relay `message` to its room. Returns how many sockets were listening.
    pub async fn publish(&self, origin: Option<Uuid>, message: ChatMessage) -> usize {
        let room = message.chat_id.to_string();
        self.rooms.publish(&room, RoomFrame { origin, message }).await
    }

    /// Listen to `room`.
    pub async fn subscribe(&self, room: Uuid) -> broadcast::Receiver<RoomFrame> {
        self.rooms.subscribe(&room.to_string()).await
    }

    /// Sockets currently listening to `room`.
    pub async fn listeners(&self, room: Uuid) -> usize {
        self.rooms.subscriber_count(&room.to_string()).await
    }

    /// Rooms tracked by the hub; emptied rooms count until the next prune.
    pub async fn rooms(&self) -> usize {
        self.rooms.topic_count().await
    }

    /// Forget rooms nobody listens to.
    pub async fn prune(&self) -> usize {
        self.rooms.prune().await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(chat_id: Uuid) -> ChatMessage {
        let now = Utc::now();
        ChatMessage {
            id: Uuid::new_v4(),
            chat_id,
            sender_id: Uuid::new_v4(),
            content: "hello".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_room_only() {
        let hub = ChatHub::new(8);
        let room = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut in_room = hub.subscribe(room).await;
        let mut elsewhere = hub.subscribe(other).await;

        let origin = Uuid::new_v4();
        assert_eq!(hub.publish(Some(origin), message(room)).await, 1);

        let frame = in_room.recv().await.expect("frame");
        assert_eq!(frame.origin, Some(origin));
        assert_eq!(frame.message.chat_id, room);
        assert!(elsewhere.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_prune_after_last_listener_leaves() {
        let hub = ChatHub::new(8);
        let room = Uuid::new_v4();
        let rx = hub.subscribe(room).await;
        assert_eq!(hub.listeners(room).await, 1);

        drop(rx);
        assert_eq!(hub.rooms().await, 1);
        assert_eq!(hub.prune().await, 1);
        assert_eq!(hub.rooms().await, 0);
        assert_eq!(hub.publish(None, message(room)).await, 0);
    }
}
