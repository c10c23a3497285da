//! In-process domain event dispatch.
//!
//! Domain events are handled inside the unit of work that raised them:
//! handlers run sequentially, and any failure propagates to the command
//! function, which rolls the whole transaction back. Handlers translate thin
//! domain events into thick integration events by staging them on the
//! [`OutboxBatch`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::outbox::OutboxBatch;

/// Handler for one module's domain events.
///
/// `E` is the module's domain event enum. Handlers must not assume they run
/// after the transaction commits — they run inside it.
#[async_trait]
pub trait DomainEventHandler<E>: Send + Sync {
    /// Stable handler name for logging.
    fn name(&self) -> &'static str;

    /// Handles the event, staging any translated integration events on
    /// `batch`.
    ///
    /// # Errors
    ///
    /// Any error aborts the dispatch and, through the caller, the whole
    /// business transaction.
    async fn handle(
        &self,
        envelope: &EventEnvelope<E>,
        batch: &mut OutboxBatch,
    ) -> Result<(), EventError>;
}

/// Ordered, sequential dispatcher for one module's domain events.
pub struct DomainDispatcher<E> {
    handlers: Vec<Arc<dyn DomainEventHandler<E>>>,
}

impl<E> std::fmt::Debug for DomainDispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<E: Send + Sync> DomainDispatcher<E> {
    /// Creates a dispatcher over the given handlers, invoked in order.
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn DomainEventHandler<E>>>) -> Self {
        Self { handlers }
    }

    /// Invokes every handler sequentially (never fire-and-forget).
    ///
    /// # Errors
    ///
    /// Returns the first handler error, wrapped with the handler's name;
    /// later handlers do not run.
    pub async fn dispatch(
        &self,
        envelope: &EventEnvelope<E>,
        batch: &mut OutboxBatch,
    ) -> Result<(), EventError> {
        for handler in &self.handlers {
            if let Err(err) = handler.handle(envelope, batch).await {
                tracing::error!(
                    handler = handler.name(),
                    event_id = %envelope.event_id,
                    error = %err,
                    "domain event handler failed; aborting unit of work"
                );
                return Err(EventError::Handler {
                    handler: handler.name().to_owned(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }
}
