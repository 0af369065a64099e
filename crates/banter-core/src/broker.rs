//! In-process topic registry for the banter relay.
//!
//! The broker maps topic names to live subscriber channels and fans each
//! published event out to every subscriber, without blocking on slow
//! consumers.

use std::sync::Arc;

use banter_protocol::ChatEvent;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::topic::{validate_topic_name, Topic};

/// Broker errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Invalid topic name.
    #[error("Invalid topic name: {0}")]
    InvalidTopic(&'static str),
}

/// The broadcast broker.
///
/// Topics are created on first subscribe and removed when their last
/// subscriber leaves. Publishing to a topic nobody subscribes to is not an
/// error; the event simply reaches zero receivers.
pub struct Broker {
    /// Topics indexed by name.
    topics: DashMap<String, Topic>,
    /// Connection subscriptions (connection_id -> set of topic names).
    subscriptions: DashMap<String, dashmap::DashSet<String>>,
    /// Broadcast channel capacity for new topics.
    capacity: usize,
}

impl Broker {
    /// Create a new broker with the default per-topic capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new broker with a specific per-topic channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            subscriptions: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe a connection to a topic.
    ///
    /// The topic is created if it does not exist yet. Returns a receiver
    /// for events published to the topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic name is invalid.
    pub fn subscribe(
        &self,
        connection_id: &str,
        topic_name: &str,
    ) -> Result<broadcast::Receiver<Arc<ChatEvent>>, BrokerError> {
        validate_topic_name(topic_name).map_err(BrokerError::InvalidTopic)?;

        let mut entry = self
            .topics
            .entry(topic_name.to_string())
            .or_insert_with(|| {
                debug!(topic = %topic_name, "Creating new topic");
                Topic::with_capacity(topic_name, self.capacity)
            });

        let receiver = entry.subscribe(connection_id);
        self.subscriptions
            .entry(connection_id.to_string())
            .or_default()
            .insert(topic_name.to_string());

        debug!(
            topic = %topic_name,
            connection = %connection_id,
            subscribers = entry.subscriber_count(),
            "Subscribed"
        );

        Ok(receiver)
    }

    /// Unsubscribe a connection from a topic.
    ///
    /// Returns `true` if the connection was subscribed. The topic is
    /// removed once its last subscriber leaves.
    pub fn unsubscribe(&self, connection_id: &str, topic_name: &str) -> bool {
        if let Some(conn_subs) = self.subscriptions.get(connection_id) {
            if conn_subs.remove(topic_name).is_none() {
                return false;
            }
        } else {
            return false;
        }

        if let Some(mut entry) = self.topics.get_mut(topic_name) {
            entry.unsubscribe(connection_id);

            if entry.is_empty() {
                drop(entry); // Release the lock
                self.topics.remove(topic_name);
                debug!(topic = %topic_name, "Removed empty topic");
            }
        }

        true
    }

    /// Unsubscribe a connection from all topics.
    pub fn unsubscribe_all(&self, connection_id: &str) {
        if let Some((_, topics)) = self.subscriptions.remove(connection_id) {
            for topic_name in topics.iter() {
                if let Some(mut entry) = self.topics.get_mut(topic_name.as_str()) {
                    entry.unsubscribe(connection_id);

                    if entry.is_empty() {
                        let name = topic_name.clone();
                        drop(entry);
                        self.topics.remove(&name);
                    }
                }
            }
        }

        debug!(connection = %connection_id, "Unsubscribed from all topics");
    }

    /// Publish an event to a topic.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, topic_name: &str, event: ChatEvent) -> usize {
        if let Some(entry) = self.topics.get(topic_name) {
            let count = entry.publish(event);
            trace!(topic = %topic_name, recipients = count, "Published event");
            count
        } else {
            warn!(topic = %topic_name, "Publish to non-existent topic");
            0
        }
    }

    /// Check if a topic exists.
    #[must_use]
    pub fn topic_exists(&self, topic_name: &str) -> bool {
        self.topics.contains_key(topic_name)
    }

    /// Get the subscriber count for a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic_name: &str) -> usize {
        self.topics
            .get(topic_name)
            .map(|t| t.subscriber_count())
            .unwrap_or(0)
    }

    /// Get all topic names.
    #[must_use]
    pub fn topic_names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.key().clone()).collect()
    }

    /// Get broker statistics.
    #[must_use]
    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            topic_count: self.topics.len(),
            connection_count: self.subscriptions.len(),
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// Broker statistics.
#[derive(Debug, Clone)]
pub struct BrokerStats {
    /// Number of active topics.
    pub topic_count: usize,
    /// Number of connections holding subscriptions.
    pub connection_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_protocol::EventKind;

    fn message(content: &str) -> ChatEvent {
        ChatEvent::with("alice", content, EventKind::Message)
    }

    #[test]
    fn test_broker_subscribe_unsubscribe() {
        let broker = Broker::new();

        let rx = broker.subscribe("conn-1", "public").unwrap();
        assert!(broker.topic_exists("public"));
        assert_eq!(broker.subscriber_count("public"), 1);
        drop(rx);

        assert!(broker.unsubscribe("conn-1", "public"));
        // Topic should be removed with its last subscriber
        assert!(!broker.topic_exists("public"));
    }

    #[test]
    fn test_broker_publish_reaches_all_subscribers() {
        let broker = Broker::new();

        let mut rx1 = broker.subscribe("conn-1", "public").unwrap();
        let mut rx2 = broker.subscribe("conn-2", "public").unwrap();

        let count = broker.publish("public", message("hi"));
        assert_eq!(count, 2);

        assert_eq!(rx1.try_recv().unwrap().content, "hi");
        assert_eq!(rx2.try_recv().unwrap().content, "hi");
    }

    #[test]
    fn test_broker_publish_is_scoped_to_topic() {
        let broker = Broker::new();

        let mut rx1 = broker.subscribe("conn-1", "public").unwrap();
        let mut rx2 = broker.subscribe("conn-2", "private").unwrap();

        broker.publish("public", message("hi"));

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_broker_publish_without_subscribers() {
        let broker = Broker::new();
        assert_eq!(broker.publish("nobody", message("hi")), 0);
    }

    #[test]
    fn test_broker_invalid_topic() {
        let broker = Broker::new();
        assert!(matches!(
            broker.subscribe("conn-1", ""),
            Err(BrokerError::InvalidTopic(_))
        ));
    }

    #[test]
    fn test_broker_unsubscribe_all() {
        let broker = Broker::new();

        let _rx1 = broker.subscribe("conn-1", "topic-1").unwrap();
        let _rx2 = broker.subscribe("conn-1", "topic-2").unwrap();
        let _rx3 = broker.subscribe("conn-2", "topic-1").unwrap();

        broker.unsubscribe_all("conn-1");

        assert!(!broker.topic_exists("topic-2"));
        assert!(broker.topic_exists("topic-1"));
        assert_eq!(broker.subscriber_count("topic-1"), 1);
    }

    #[test]
    fn test_broker_stats() {
        let broker = Broker::new();

        let _rx1 = broker.subscribe("conn-1", "topic-1").unwrap();
        let _rx2 = broker.subscribe("conn-2", "topic-1").unwrap();

        let stats = broker.stats();
        assert_eq!(stats.topic_count, 1);
        assert_eq!(stats.connection_count, 2);
    }

    #[tokio::test]
    async fn test_broker_identical_copies() {
        let broker = Broker::new();

        let mut rx1 = broker.subscribe("conn-1", "public").unwrap();
        let mut rx2 = broker.subscribe("conn-2", "public").unwrap();

        let event = ChatEvent::with("alice", "hi", EventKind::Join);
        broker.publish("public", event.clone());

        let got1 = rx1.recv().await.unwrap();
        let got2 = rx2.recv().await.unwrap();
        assert_eq!(*got1, event);
        assert_eq!(*got1, *got2);
    }
}
