//! Outbox publisher worker.
//!
//! Polls the outbox for due rows, publishes each to the broker under a topic
//! derived from its `(event_name, event_version)`, and marks it processed —
//! or schedules a capped exponential retry. Per-message state machine:
//! `Pending -> Publishing -> Processed`, or back to `Pending` with backoff.
//!
//! Delivery is at-least-once: a crash after the broker accepted a message
//! but before `mark_processed` leaves the row pending, and it is published
//! again once its claim lease expires. Failed rows are never deleted; they
//! stay visible to the outbox health stats.

use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use paintworks_core::clock::Clock;
use paintworks_core::envelope::WireMessage;
use paintworks_core::error::EventError;
use paintworks_core::event::topic_for;
use paintworks_core::outbox::OutboxStore;

use crate::backoff;
use crate::broker::MessageBroker;
use crate::worker::WorkerHandle;

/// Publisher tuning.
#[derive(Debug, Clone, Copy)]
pub struct PublisherConfig {
    /// Delay between outbox polls.
    pub poll_interval: std::time::Duration,
    /// Maximum rows claimed per poll.
    pub batch_size: u32,
    /// Claim lease stamped on fetched rows; a crashed publisher's rows
    /// become due again once this passes.
    pub claim_lease: chrono::Duration,
    /// First-retry backoff.
    pub backoff_base: chrono::Duration,
    /// Backoff ceiling.
    pub backoff_cap: chrono::Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            poll_interval: std::time::Duration::from_secs(1),
            batch_size: 32,
            claim_lease: chrono::Duration::seconds(30),
            backoff_base: chrono::Duration::seconds(2),
            backoff_cap: chrono::Duration::minutes(5),
        }
    }
}

/// Background worker publishing pending outbox rows to the broker.
pub struct OutboxPublisher {
    store: Arc<dyn OutboxStore>,
    broker: Arc<dyn MessageBroker>,
    clock: Arc<dyn Clock>,
    config: PublisherConfig,
}

impl std::fmt::Debug for OutboxPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxPublisher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OutboxPublisher {
    /// Creates a publisher over the given store and broker.
    #[must_use]
    pub fn new(
        store: Arc<dyn OutboxStore>,
        broker: Arc<dyn MessageBroker>,
        clock: Arc<dyn Clock>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            store,
            broker,
            clock,
            config,
        }
    }

    /// Starts the poll loop. The returned handle cancels and joins it; the
    /// batch in flight when cancellation arrives runs to completion first.
    #[must_use]
    pub fn start(self: Arc<Self>) -> WorkerHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.publish_due().await {
                            tracing::warn!(error = %err, "outbox poll failed; will retry next tick");
                        }
                    }
                }
            }
            tracing::info!("outbox publisher stopped");
        });
        WorkerHandle::new(token, task)
    }

    /// Claims one batch of due rows and publishes them, oldest first.
    ///
    /// Broker rejections are handled per message (attempt bump plus
    /// backoff); only store failures abort the batch. Returns how many
    /// messages the broker accepted.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` if claiming or marking rows fails.
    pub async fn publish_due(&self) -> Result<usize, EventError> {
        let now = self.clock.now();
        let batch = self
            .store
            .claim_due(self.config.batch_size, self.config.claim_lease, now)
            .await?;
        if batch.is_empty() {
            return Ok(0);
        }

        let mut published = 0_usize;
        for message in batch {
            let topic = topic_for(&message.event_name, message.event_version);
            let frame = WireMessage {
                event_name: message.event_name.clone(),
                event_version: message.event_version,
                envelope: message.payload.clone(),
            };

            match self.broker.publish(&topic, &frame).await {
                Ok(()) => {
                    self.store.mark_processed(message.id, self.clock.now()).await?;
                    published += 1;
                    tracing::debug!(event_id = %message.id, topic, "outbox message published");
                }
                Err(err) => {
                    let attempt = message.attempts + 1;
                    let delay = backoff::exponential(
                        self.config.backoff_base,
                        self.config.backoff_cap,
                        attempt,
                    );
                    let retry_at = self.clock.now() + delay;
                    self.store.mark_failed(message.id, retry_at).await?;
                    tracing::warn!(
                        event_id = %message.id,
                        topic,
                        attempt,
                        retry_at = %retry_at,
                        error = %err,
                        "publish failed; scheduled retry"
                    );
                }
            }
        }
        Ok(published)
    }
}
