//! Producer fan-out
//!
//! The single publishing endpoint for one topic. A producer owns the set
//! of subscribed consumers and broadcasts every pushed payload to each of
//! their queues. Pushes never block on a slow subscriber: a full queue is
//! resolved by the configured overflow policy, and subscribers whose queue
//! has closed are pruned as they are found.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;

use super::config::{OverflowPolicy, RegistryConfig};
use super::consumer::{Consumer, ConsumerId};
use super::topic::Topic;
use crate::wire::Payload;

/// The single publishing endpoint for one topic
///
/// Shared between the registry entry and every connection task that looked
/// it up; all subscriber-set mutation is serialized by one internal lock.
#[derive(Debug)]
pub struct Producer {
    topic: Topic,

    /// Subscribed consumers; order is irrelevant, removal is by identity
    subscribers: Mutex<Vec<Consumer>>,

    /// Policy applied when a subscriber's queue is full
    overflow_policy: OverflowPolicy,

    /// Terminal flag, written only under the subscriber lock
    disconnected: AtomicBool,

    /// Payloads dropped by the DropNewest policy
    dropped_payloads: AtomicU64,
}

impl Producer {
    pub(super) fn new(topic: Topic, config: &RegistryConfig) -> Self {
        Self {
            topic,
            subscribers: Mutex::new(Vec::new()),
            overflow_policy: config.overflow_policy,
            disconnected: AtomicBool::new(false),
            dropped_payloads: AtomicU64::new(0),
        }
    }

    /// Topic this producer publishes
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Whether `disconnect` has run
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Payloads dropped so far by the DropNewest overflow policy
    pub fn dropped_payloads(&self) -> u64 {
        self.dropped_payloads.load(Ordering::Relaxed)
    }

    /// Number of current subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Add a subscriber.
    ///
    /// A producer that has already disconnected refuses the subscription:
    /// the consumer is dropped here, which closes its queue and ends its
    /// delivery task.
    pub async fn subscribe(&self, consumer: Consumer) {
        let mut subscribers = self.subscribers.lock().await;

        if self.disconnected.load(Ordering::Acquire) {
            tracing::debug!(
                topic = %self.topic,
                consumer_id = %consumer.id(),
                "Subscribe refused, producer already disconnected"
            );
            return;
        }

        tracing::debug!(
            topic = %self.topic,
            consumer_id = %consumer.id(),
            subscribers = subscribers.len() + 1,
            "Subscriber added"
        );
        subscribers.push(consumer);
    }

    /// Remove the subscriber with the given identity. No-op if absent.
    pub async fn unsubscribe(&self, id: ConsumerId) {
        let mut subscribers = self.subscribers.lock().await;

        if let Some(pos) = subscribers.iter().position(|c| c.id() == id) {
            subscribers.remove(pos);
            tracing::debug!(
                topic = %self.topic,
                consumer_id = %id,
                subscribers = subscribers.len(),
                "Subscriber removed"
            );
        }
    }

    /// Broadcast one payload to every current subscriber.
    ///
    /// Enqueues without blocking. Zero subscribers is a no-op, and so is
    /// pushing after `disconnect`.
    pub async fn push(&self, payload: Payload) {
        if self.disconnected.load(Ordering::Acquire) {
            return;
        }

        let mut subscribers = self.subscribers.lock().await;

        subscribers.retain(|consumer| match consumer.enqueue(payload.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => match self.overflow_policy {
                OverflowPolicy::DropNewest => {
                    self.dropped_payloads.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        topic = %self.topic,
                        consumer_id = %consumer.id(),
                        "Delivery queue full, payload dropped"
                    );
                    true
                }
                OverflowPolicy::Disconnect => {
                    tracing::warn!(
                        topic = %self.topic,
                        consumer_id = %consumer.id(),
                        "Delivery queue full, disconnecting slow consumer"
                    );
                    false
                }
            },
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(
                    topic = %self.topic,
                    consumer_id = %consumer.id(),
                    "Delivery queue closed, pruning subscriber"
                );
                false
            }
        });
    }

    /// Terminal teardown: close every subscriber's queue and clear the set.
    ///
    /// Signals each delivery task to exit once its queue drains. Later
    /// pushes and subscribes become no-ops. Safe with zero subscribers and
    /// safe to call more than once.
    pub async fn disconnect(&self) {
        let mut subscribers = self.subscribers.lock().await;

        self.disconnected.store(true, Ordering::Release);
        let released = subscribers.len();
        // Dropping each consumer closes its queue
        subscribers.clear();

        tracing::info!(topic = %self.topic, subscribers = released, "Producer disconnected");
    }
}
