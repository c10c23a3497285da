//! Integration consumer worker.
//!
//! One consumer runs per subscribing module. For each delivery it resolves
//! the declared `(name, version)` against the registry, rehydrates the
//! envelope's trace context into the handling span, and drives the module's
//! handlers with inbox idempotency: a `(event_id, handler_name)` pair is
//! applied at most once in effect no matter how often the broker delivers
//! the message.
//!
//! Failure isolation is per message: an unknown event type is logged and
//! dead-lettered (acked away), a handler failure nacks only that delivery,
//! and the loop keeps going either way.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use paintworks_core::clock::Clock;
use paintworks_core::envelope::EventEnvelope;
use paintworks_core::error::EventError;
use paintworks_core::integration::{IntegrationEventHandler, Subscription};
use paintworks_core::outbox::InboxStore;
use paintworks_core::registry::EventTypeRegistry;

use crate::broker::{BrokerSubscription, Delivery, MessageBroker};
use crate::worker::WorkerHandle;

/// Consumer tuning.
#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    /// Delay before the broker redelivers a nacked message.
    pub requeue_delay: std::time::Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            requeue_delay: std::time::Duration::from_secs(5),
        }
    }
}

enum Outcome {
    Ack,
    Requeue,
}

/// Background worker consuming one module's queue.
pub struct IntegrationConsumer {
    registry: Arc<EventTypeRegistry>,
    inbox: Arc<dyn InboxStore>,
    clock: Arc<dyn Clock>,
    queue: String,
    bindings: Vec<String>,
    handlers: HashMap<(String, i16), Vec<Arc<dyn IntegrationEventHandler>>>,
    config: ConsumerConfig,
}

impl std::fmt::Debug for IntegrationConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationConsumer")
            .field("queue", &self.queue)
            .field("bindings", &self.bindings)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl IntegrationConsumer {
    /// Creates a consumer for a module's subscription.
    #[must_use]
    pub fn new(
        registry: Arc<EventTypeRegistry>,
        inbox: Arc<dyn InboxStore>,
        clock: Arc<dyn Clock>,
        subscription: Subscription,
        config: ConsumerConfig,
    ) -> Self {
        let mut handlers: HashMap<(String, i16), Vec<Arc<dyn IntegrationEventHandler>>> =
            HashMap::new();
        for handler in subscription.handlers {
            handlers
                .entry((handler.event_name().to_owned(), handler.event_version()))
                .or_default()
                .push(handler);
        }
        Self {
            registry,
            inbox,
            clock,
            queue: subscription.queue,
            bindings: subscription.bindings,
            handlers,
            config,
        }
    }

    /// Binds the queue and starts the consume loop.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Broker` if the subscription cannot be set up.
    pub async fn start(self, broker: &dyn MessageBroker) -> Result<WorkerHandle, EventError> {
        let subscription = broker.subscribe(&self.queue, &self.bindings).await?;
        tracing::info!(queue = self.queue, bindings = ?self.bindings, "consumer subscribed");

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(self.run(subscription, loop_token));
        Ok(WorkerHandle::new(token, task))
    }

    async fn run(self, mut subscription: Box<dyn BrokerSubscription>, token: CancellationToken) {
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                maybe_delivery = subscription.next() => {
                    let Some(delivery) = maybe_delivery else { break };
                    match self.process(&delivery).await {
                        Outcome::Ack => {
                            if let Err(err) = subscription.ack(&delivery).await {
                                tracing::warn!(error = %err, "ack failed");
                            }
                        }
                        Outcome::Requeue => {
                            if let Err(err) = subscription
                                .nack(&delivery, self.config.requeue_delay)
                                .await
                            {
                                tracing::warn!(error = %err, "nack failed");
                            }
                        }
                    }
                }
            }
        }
        tracing::info!(queue = self.queue, "consumer stopped");
    }

    async fn process(&self, delivery: &Delivery) -> Outcome {
        let name = &delivery.message.event_name;
        let version = delivery.message.event_version;

        // Unknown event types must not crash or wedge the loop: log and ack
        // so the rest of the batch keeps flowing.
        let Some(descriptor) = self.registry.resolve(name, version) else {
            tracing::warn!(
                queue = self.queue,
                event_name = %name,
                event_version = version,
                "unknown event type; dead-lettering"
            );
            return Outcome::Ack;
        };

        // The envelope header carries identity and trace propagation even
        // when the payload type is opaque here.
        let head: EventEnvelope<serde_json::Value> =
            match serde_json::from_value(delivery.message.envelope.clone()) {
                Ok(head) => head,
                Err(err) => {
                    tracing::error!(
                        queue = self.queue,
                        event_name = %name,
                        error = %err,
                        "malformed envelope; dead-lettering"
                    );
                    return Outcome::Ack;
                }
            };
        if let Err(err) = descriptor.check_envelope(&delivery.message.envelope) {
            tracing::error!(
                queue = self.queue,
                event_name = %name,
                event_id = %head.event_id,
                error = %err,
                "envelope does not match registered type; dead-lettering"
            );
            return Outcome::Ack;
        }

        let span = tracing::info_span!(
            "consume_integration_event",
            queue = %self.queue,
            event_name = %name,
            event_version = version,
            event_id = %head.event_id,
            correlation_id = %head.correlation_id,
            tenant_id = %head.tenant_id,
            redelivered = delivery.redelivered,
            trace_id = tracing::field::Empty,
            parent_span_id = tracing::field::Empty,
        );
        if let Some(trace) = &head.trace {
            span.record("trace_id", trace.trace_id.as_str());
            if let Some(parent) = &trace.parent_span_id {
                span.record("parent_span_id", parent.as_str());
            }
        }

        self.run_handlers(delivery, &head, name, version)
            .instrument(span)
            .await
    }

    async fn run_handlers(
        &self,
        delivery: &Delivery,
        head: &EventEnvelope<serde_json::Value>,
        name: &str,
        version: i16,
    ) -> Outcome {
        let Some(handlers) = self.handlers.get(&(name.to_owned(), version)) else {
            tracing::debug!("no handlers registered; acking");
            return Outcome::Ack;
        };

        for handler in handlers {
            match self.inbox.already_processed(head.event_id, handler.name()).await {
                Ok(true) => {
                    tracing::debug!(handler = handler.name(), "already processed; skipping");
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(handler = handler.name(), error = %err, "inbox check failed");
                    return Outcome::Requeue;
                }
            }

            if let Err(err) = handler.handle(&delivery.message.envelope).await {
                tracing::warn!(
                    handler = handler.name(),
                    error = %err,
                    "handler failed; requeueing delivery"
                );
                return Outcome::Requeue;
            }

            if let Err(err) = self
                .inbox
                .record_processed(head.event_id, handler.name(), self.clock.now())
                .await
            {
                // The effect is applied but unrecorded; redelivery re-runs
                // the handler, which must tolerate that (at-least-once).
                tracing::warn!(handler = handler.name(), error = %err, "inbox record failed");
                return Outcome::Requeue;
            }
        }
        Outcome::Ack
    }
}
