//! Message broker seam and the in-memory broker.
//!
//! The traits model the slice of a topic-based broker the pipeline needs:
//! publish under a topic, bind a named queue to wildcard patterns, and
//! ack/nack deliveries. [`InMemoryBroker`] implements them over tokio
//! channels for local runs and tests; a production deployment plugs an AMQP
//! or similar implementation into the same seam.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use paintworks_core::envelope::WireMessage;
use paintworks_core::error::EventError;

use crate::topic::topic_matches;

/// One message handed to a queue consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Broker-assigned tag, unique per delivery (not per message).
    pub delivery_tag: u64,
    /// The topic the message was published under.
    pub topic: String,
    /// The published frame.
    pub message: WireMessage,
    /// Whether this delivery is a redelivery after a nack.
    pub redelivered: bool,
}

/// Topic-based publish/subscribe broker.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes a message under `topic` to every bound queue.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Broker` if the broker rejects the publish.
    async fn publish(&self, topic: &str, message: &WireMessage) -> Result<(), EventError>;

    /// Binds the named queue to the given topic patterns and returns its
    /// consumer handle. Each queue has exactly one consumer; modules scale
    /// by queue, not by competing consumers on one queue.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Broker` if the subscription cannot be set up or
    /// the queue already has a consumer.
    async fn subscribe(
        &self,
        queue: &str,
        bindings: &[String],
    ) -> Result<Box<dyn BrokerSubscription>, EventError>;
}

/// Consumer handle for one queue.
#[async_trait]
pub trait BrokerSubscription: Send {
    /// Waits for the next delivery. `None` means the queue is gone.
    async fn next(&mut self) -> Option<Delivery>;

    /// Acknowledges a delivery; the broker forgets it.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Broker` on broker failure.
    async fn ack(&mut self, delivery: &Delivery) -> Result<(), EventError>;

    /// Rejects a delivery; the broker redelivers it after `requeue_after`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Broker` on broker failure.
    async fn nack(&mut self, delivery: &Delivery, requeue_after: Duration)
    -> Result<(), EventError>;
}

#[derive(Debug)]
struct QueueState {
    bindings: Vec<String>,
    tx: mpsc::UnboundedSender<Delivery>,
}

#[derive(Debug, Default)]
struct BrokerState {
    queues: HashMap<String, QueueState>,
    next_tag: u64,
}

/// In-memory topic broker over tokio channels.
///
/// Deliveries are at-least-once: a nacked delivery is re-sent to the queue
/// after the requeue delay with `redelivered` set. There is no persistence —
/// durability in the pipeline comes from the outbox, not the broker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, message: &WireMessage) -> Result<(), EventError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        let mut matched = 0_usize;
        let mut deliveries = Vec::new();
        for (queue, q) in &state.queues {
            if q.bindings.iter().any(|b| topic_matches(b, topic)) {
                matched += 1;
                deliveries.push((queue.clone(), q.tx.clone()));
            }
        }
        for (queue, tx) in deliveries {
            state.next_tag += 1;
            let delivery = Delivery {
                delivery_tag: state.next_tag,
                topic: topic.to_owned(),
                message: message.clone(),
                redelivered: false,
            };
            if tx.send(delivery).is_err() {
                tracing::debug!(queue, "dropping delivery to closed queue");
            }
        }
        tracing::trace!(topic, matched, "published");
        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        bindings: &[String],
    ) -> Result<Box<dyn BrokerSubscription>, EventError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        if state.queues.contains_key(queue) {
            return Err(EventError::Broker(format!(
                "queue '{queue}' already has a consumer"
            )));
        }
        state.queues.insert(
            queue.to_owned(),
            QueueState {
                bindings: bindings.to_vec(),
                tx,
            },
        );
        Ok(Box::new(InMemorySubscription {
            queue: queue.to_owned(),
            rx,
            state: Arc::clone(&self.state),
        }))
    }
}

fn poisoned() -> EventError {
    EventError::Broker("broker state poisoned".into())
}

struct InMemorySubscription {
    queue: String,
    rx: mpsc::UnboundedReceiver<Delivery>,
    state: Arc<Mutex<BrokerState>>,
}

#[async_trait]
impl BrokerSubscription for InMemorySubscription {
    async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), EventError> {
        tracing::trace!(queue = self.queue, tag = delivery.delivery_tag, "acked");
        Ok(())
    }

    async fn nack(
        &mut self,
        delivery: &Delivery,
        requeue_after: Duration,
    ) -> Result<(), EventError> {
        let state = Arc::clone(&self.state);
        let queue = self.queue.clone();
        let mut redelivery = delivery.clone();
        redelivery.redelivered = true;
        tokio::spawn(async move {
            tokio::time::sleep(requeue_after).await;
            let tx = {
                let guard = match state.lock() {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
                guard.queues.get(&queue).map(|q| q.tx.clone())
            };
            if let Some(tx) = tx {
                let _ = tx.send(redelivery);
            }
        });
        Ok(())
    }
}
