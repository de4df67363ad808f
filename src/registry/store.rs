//! Topic registry implementation
//!
//! The single process-wide table mapping each topic to its live producer.
//! All access goes through `register`/`lookup`/`unregister`; the map lock
//! is held only for the map operation itself, never across network I/O.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::producer::Producer;
use super::topic::Topic;

/// Central registry of all live topics
///
/// Thread-safe via `RwLock`; lookups from consumer connections take the
/// read lock, registration and teardown take the write lock.
pub struct TopicRegistry {
    /// Map of topic to its single producer
    topics: RwLock<HashMap<Topic, Arc<Producer>>>,

    /// Configuration applied to every producer created here
    config: RegistryConfig,
}

impl TopicRegistry {
    /// Create a registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Claim a topic for a new producer.
    ///
    /// The existence check and the insert happen under one critical
    /// section: of two concurrent registrations for the same topic,
    /// exactly one succeeds and the other gets `TopicAlreadyRegistered`.
    pub async fn register(&self, topic: &Topic) -> Result<Arc<Producer>, RegistryError> {
        let mut topics = self.topics.write().await;

        if topics.contains_key(topic) {
            return Err(RegistryError::TopicAlreadyRegistered(topic.clone()));
        }

        let producer = Arc::new(Producer::new(topic.clone(), &self.config));
        topics.insert(topic.clone(), Arc::clone(&producer));

        tracing::info!(topic = %topic, topics = topics.len(), "Producer registered");

        Ok(producer)
    }

    /// Point-in-time lookup of a topic's producer.
    ///
    /// The returned handle stays valid for use after the lock is released;
    /// its lifetime is governed by the disconnect protocol, not the lock.
    pub async fn lookup(&self, topic: &Topic) -> Result<Arc<Producer>, RegistryError> {
        let topics = self.topics.read().await;

        topics
            .get(topic)
            .cloned()
            .ok_or_else(|| RegistryError::TopicUnavailable(topic.clone()))
    }

    /// Remove a topic's entry, returning the producer it held.
    ///
    /// A topic that is not present is left untouched.
    pub async fn unregister(&self, topic: &Topic) -> Option<Arc<Producer>> {
        let mut topics = self.topics.write().await;

        let removed = topics.remove(topic);
        if removed.is_some() {
            tracing::info!(topic = %topic, topics = topics.len(), "Producer unregistered");
        }

        removed
    }

    /// Number of live topics
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Snapshot of one topic's state
    pub async fn topic_stats(&self, topic: &Topic) -> Option<TopicStats> {
        let producer = self.topics.read().await.get(topic).cloned()?;

        Some(TopicStats {
            subscriber_count: producer.subscriber_count().await,
            dropped_payloads: producer.dropped_payloads(),
            disconnected: producer.is_disconnected(),
        })
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of one topic
#[derive(Debug, Clone)]
pub struct TopicStats {
    /// Number of subscribed consumers
    pub subscriber_count: usize,
    /// Payloads dropped for slow consumers
    pub dropped_payloads: u64,
    /// Whether the producer has already torn down
    pub disconnected: bool,
}
