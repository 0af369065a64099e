//! Topic abstraction for the banter broker.
//!
//! A topic is a named broadcast address: every subscriber receives every
//! event published to it.

use std::collections::HashSet;
use std::sync::Arc;

use banter_protocol::ChatEvent;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Maximum topic name length.
pub const MAX_TOPIC_NAME_LENGTH: usize = 128;

/// Default broadcast channel capacity.
const DEFAULT_TOPIC_CAPACITY: usize = 256;

/// Validate a topic name.
///
/// # Errors
///
/// Returns an error message if the topic name is invalid.
pub fn validate_topic_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Topic name cannot be empty");
    }
    if name.len() > MAX_TOPIC_NAME_LENGTH {
        return Err("Topic name too long");
    }
    if !name.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err("Topic name contains invalid characters");
    }
    Ok(())
}

/// A named broadcast address.
///
/// Fan-out never blocks the publisher: each subscriber reads from a bounded
/// broadcast channel, and a subscriber that falls more than the capacity
/// behind loses the oldest events instead of stalling anyone.
#[derive(Debug)]
pub struct Topic {
    /// Topic name.
    name: String,
    /// Broadcast sender for this topic.
    sender: broadcast::Sender<Arc<ChatEvent>>,
    /// Set of subscribed connection IDs.
    subscribers: HashSet<String>,
    /// Channel capacity.
    capacity: usize,
}

impl Topic {
    /// Create a new topic with the default capacity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_TOPIC_CAPACITY)
    }

    /// Create a new topic with a specific channel capacity.
    #[must_use]
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name: name.into(),
            sender,
            subscribers: HashSet::new(),
            capacity,
        }
    }

    /// Get the topic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if a connection is subscribed.
    #[must_use]
    pub fn is_subscribed(&self, connection_id: &str) -> bool {
        self.subscribers.contains(connection_id)
    }

    /// Subscribe a connection to this topic.
    ///
    /// Returns a receiver for events published to this topic.
    pub fn subscribe(
        &mut self,
        connection_id: impl Into<String>,
    ) -> broadcast::Receiver<Arc<ChatEvent>> {
        let conn_id = connection_id.into();
        self.subscribers.insert(conn_id.clone());
        debug!(topic = %self.name, connection = %conn_id, "Connection subscribed");
        self.sender.subscribe()
    }

    /// Unsubscribe a connection from this topic.
    ///
    /// Returns `true` if the connection was subscribed.
    pub fn unsubscribe(&mut self, connection_id: &str) -> bool {
        let removed = self.subscribers.remove(connection_id);
        if removed {
            debug!(topic = %self.name, connection = %connection_id, "Connection unsubscribed");
        }
        removed
    }

    /// Publish an event to this topic.
    ///
    /// Returns the number of receivers that got the event.
    pub fn publish(&self, event: ChatEvent) -> usize {
        let event = Arc::new(event);
        trace!(topic = %self.name, "Publishing event");
        self.sender.send(event).unwrap_or_default()
    }

    /// Check if the topic has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_protocol::EventKind;

    #[test]
    fn test_topic_creation() {
        let topic = Topic::new("public");
        assert_eq!(topic.name(), "public");
        assert_eq!(topic.subscriber_count(), 0);
        assert!(topic.is_empty());
    }

    #[test]
    fn test_topic_subscribe_unsubscribe() {
        let mut topic = Topic::new("public");

        let _rx = topic.subscribe("conn-1");
        assert_eq!(topic.subscriber_count(), 1);
        assert!(topic.is_subscribed("conn-1"));

        let _rx2 = topic.subscribe("conn-2");
        assert_eq!(topic.subscriber_count(), 2);

        assert!(topic.unsubscribe("conn-1"));
        assert_eq!(topic.subscriber_count(), 1);
        assert!(!topic.is_subscribed("conn-1"));

        // Unsubscribing a connection that already left
        assert!(!topic.unsubscribe("conn-1"));
    }

    #[test]
    fn test_topic_name_validation() {
        assert!(validate_topic_name("public").is_ok());
        assert!(validate_topic_name("").is_err());
        assert!(validate_topic_name("bad\u{1}name").is_err());

        let long_name = "a".repeat(MAX_TOPIC_NAME_LENGTH + 1);
        assert!(validate_topic_name(&long_name).is_err());
    }

    #[tokio::test]
    async fn test_topic_publish() {
        let mut topic = Topic::new("public");
        let mut rx = topic.subscribe("conn-1");

        let count = topic.publish(ChatEvent::with("alice", "hi", EventKind::Message));
        assert_eq!(count, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.sender, "alice");
        assert_eq!(event.content, "hi");
    }

    #[tokio::test]
    async fn test_lagged_subscriber_drops_oldest() {
        let mut topic = Topic::with_capacity("public", 2);
        let mut rx = topic.subscribe("conn-1");

        for i in 0..4 {
            topic.publish(ChatEvent::with("alice", i.to_string(), EventKind::Message));
        }

        // The first two events were dropped; the receiver reports the lag
        // and then yields the surviving tail.
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap().content, "2");
        assert_eq!(rx.recv().await.unwrap().content, "3");
    }
}
