//! Consumer delivery queue and task
//!
//! A consumer is a single-subscriber delivery sink: a bounded FIFO queue
//! plus exactly one task that drains it and hands each payload to a
//! caller-supplied sink. The queue closing (its sending half dropped by
//! the producer) is the task's shutdown signal.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::wire::Payload;

static NEXT_CONSUMER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique consumer identity
///
/// Subscriber removal compares ids, never queue contents: two consumers
/// with structurally identical queues are still distinct subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

impl std::fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One subscribing endpoint: the sending half of a bounded delivery queue
///
/// Held by the producer it subscribes to; dropping it closes the queue,
/// which ends the delivery task once the queue drains.
#[derive(Debug)]
pub struct Consumer {
    id: ConsumerId,
    queue: mpsc::Sender<Payload>,
}

impl Consumer {
    /// Create a consumer and start its delivery task.
    ///
    /// The queue exists and the task is running before this returns, so
    /// the consumer is fully armed before it can be subscribed anywhere
    /// and the first delivered payload cannot be lost.
    ///
    /// The sink is invoked once per payload, in queue order. A sink error
    /// ends the task early (the transport behind it is gone); remaining
    /// queued payloads are discarded with it.
    pub fn spawn<S, Fut>(capacity: usize, mut sink: S) -> (Self, JoinHandle<()>)
    where
        S: FnMut(Payload) -> Fut + Send + 'static,
        Fut: Future<Output = std::io::Result<()>> + Send,
    {
        let id = ConsumerId(NEXT_CONSUMER_ID.fetch_add(1, Ordering::Relaxed));
        let (queue, mut rx) = mpsc::channel(capacity.max(1));

        let task = tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                if let Err(e) = sink(payload).await {
                    tracing::debug!(consumer_id = %id, error = %e, "Delivery sink failed, stopping");
                    break;
                }
            }
            tracing::debug!(consumer_id = %id, "Delivery task finished");
        });

        (Self { id, queue }, task)
    }

    /// Identity used for subscriber-set removal
    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Non-blocking enqueue used by the producer's fan-out.
    pub(super) fn enqueue(&self, payload: Payload) -> Result<(), TrySendError<Payload>> {
        self.queue.try_send(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector_sink() -> (
        impl FnMut(Payload) -> std::future::Ready<std::io::Result<()>>,
        mpsc::UnboundedReceiver<Payload>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = move |payload: Payload| {
            let _ = tx.send(payload);
            std::future::ready(Ok(()))
        };
        (sink, rx)
    }

    #[tokio::test]
    async fn test_delivery_is_fifo() {
        let (sink, mut delivered) = collector_sink();
        let (consumer, task) = Consumer::spawn(8, sink);

        for i in 0..5 {
            consumer.enqueue(Payload::data(format!("p{}", i))).unwrap();
        }
        drop(consumer);
        task.await.unwrap();

        for i in 0..5 {
            assert_eq!(delivered.recv().await.unwrap().payload, format!("p{}", i));
        }
        assert!(delivered.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_task_exits_when_queue_closes() {
        let (sink, _delivered) = collector_sink();
        let (consumer, task) = Consumer::spawn(4, sink);

        drop(consumer);
        // Completes rather than hanging on an open queue
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("delivery task did not terminate")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sink_error_stops_task() {
        let (consumer, task) = Consumer::spawn(4, |_payload| {
            std::future::ready(Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe)))
        });

        consumer.enqueue(Payload::data("doomed")).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("delivery task did not terminate")
            .unwrap();
        drop(consumer);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (sink_a, _rx_a) = collector_sink();
        let (sink_b, _rx_b) = collector_sink();
        let (a, _task_a) = Consumer::spawn(1, sink_a);
        let (b, _task_b) = Consumer::spawn(1, sink_b);

        assert_ne!(a.id(), b.id());
    }
}
