//! Topic-based fan-out over tokio broadcast channels.
//!
//! Each topic (a chat room, for instance) owns one bounded
//! `broadcast::Sender`. Subscribers get every frame published after they
//! subscribed; a receiver that falls more than `capacity` frames behind
//! skips the missed ones (`RecvError::Lagged`).
//!
//! ```text
//! publish("room-1", frame) ──> Sender("room-1") ──┬──> Receiver (socket A)
//!                                                 └──> Receiver (socket B)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Default per-topic buffer.
pub const DEFAULT_CAPACITY: usize = 1000;

type Channels<T> = Arc<RwLock<HashMap<String, broadcast::Sender<T>>>>;

/// Topic broadcaster.
///
/// Cloning is cheap; clones share the same topics.
///
/// # Example
///
/// ```ignore
/// let rooms = TopicBroadcaster::<Frame>::new(256);
/// let mut rx = rooms.subscribe("room-1").await;
/// rooms.publish("room-1", frame).await;
/// let frame = rx.recv().await?;
/// ```
pub struct TopicBroadcaster<T> {
    channels: Channels<T>,
    capacity: usize,
}

impl<T> TopicBroadcaster<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a broadcaster whose topics buffer `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Publish `frame` to `topic`.
    ///
    /// Returns the number of subscribers that will see it; publishing to a
    /// topic nobody listens to is a no-op returning 0.
    pub async fn publish(&self, topic: &str, frame: T) -> usize {
        let channels = self.channels.read().await;
        channels
            .get(topic)
            .and_then(|sender| sender.send(frame).ok())
            .unwrap_or(0)
    }

    /// Subscribe to `topic`, creating it on first use.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<T> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Current subscriber count of `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .await
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Drop topics that no longer have subscribers. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }

    /// Number of live topics.
    pub async fn topic_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl<T> Default for TopicBroadcaster<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> Clone for TopicBroadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            capacity: self.capacity,
        }
    }
}

impl<T> std::fmt::Debug for TopicBroadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicBroadcaster")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let topics = TopicBroadcaster::<String>::default();
        assert_eq!(topics.publish("empty", "hello".into()).await, 0);
        assert_eq!(topics.topic_count().await, 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let topics = TopicBroadcaster::<String>::new(8);
        let mut rx1 = topics.subscribe("room").await;
        let mut rx2 = topics.subscribe("room").await;

        assert_eq!(topics.publish("room", "hi".into()).await, 2);
        assert_eq!(rx1.recv().await.expect("rx1"), "hi");
        assert_eq!(rx2.recv().await.expect("rx2"), "hi");
    }

    #[tokio::test]
    async fn test_topic_isolation() {
        let topics = TopicBroadcaster::<String>::new(8);
        let mut rx_a = topics.subscribe("a").await;
        let mut rx_b = topics.subscribe("b").await;

        topics.publish("a", "for a".into()).await;
        assert_eq!(rx_a.recv().await.expect("rx_a"), "for a");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_prune_drops_abandoned_topics() {
        let topics = TopicBroadcaster::<u32>::new(8);
        let kept = topics.subscribe("kept").await;
        drop(topics.subscribe("gone").await);

        assert_eq!(topics.subscriber_count("gone").await, 0);
        assert_eq!(topics.prune().await, 1);
        assert_eq!(topics.topic_count().await, 1);
        assert_eq!(topics.subscriber_count("kept").await, 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_lagging_receiver_skips() {
        let topics = TopicBroadcaster::<u32>::new(2);
        let mut rx = topics.subscribe("room").await;
        for n in 0..5 {
            topics.publish("room", n).await;
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.expect("after lag"), 3);
    }
}
