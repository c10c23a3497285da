//! Integration-event handler seam.
//!
//! Consuming modules implement the typed [`Handles`] trait per event type;
//! [`TypedHandler`] erases it to the `(name, version)`-keyed form the
//! consumer worker dispatches on. A module's consumers and broker bindings
//! are declared together in a [`Subscription`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::IntegrationEvent;

/// Typed handler for one integration event type.
#[async_trait]
pub trait Handles<T: IntegrationEvent>: Send + Sync {
    /// Stable handler name; the inbox keys `(event_id, handler_name)` on it,
    /// so renaming a handler re-applies historical events.
    fn name(&self) -> &'static str;

    /// Applies the event's effect. Must be safe to retry: the inbox entry is
    /// recorded only after success, so a crash in between re-runs the
    /// handler on redelivery.
    ///
    /// # Errors
    ///
    /// An error nacks the delivery; the broker redelivers with backoff.
    async fn handle(&self, envelope: &EventEnvelope<T>) -> Result<(), EventError>;
}

/// Type-erased integration handler keyed by `(event_name, event_version)`.
#[async_trait]
pub trait IntegrationEventHandler: Send + Sync {
    /// Stable handler name (see [`Handles::name`]).
    fn name(&self) -> &'static str;

    /// The event name this handler consumes.
    fn event_name(&self) -> &'static str;

    /// The event version this handler consumes.
    fn event_version(&self) -> i16;

    /// Deserializes the envelope and applies the effect.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Serialization` if the envelope does not match
    /// the handler's event type, or the typed handler's error.
    async fn handle(&self, envelope: &serde_json::Value) -> Result<(), EventError>;
}

/// Adapter erasing a typed [`Handles<T>`] into an
/// [`IntegrationEventHandler`].
pub struct TypedHandler<T, H> {
    inner: Arc<H>,
    _event: PhantomData<fn() -> T>,
}

impl<T, H> TypedHandler<T, H> {
    /// Wraps a typed handler.
    #[must_use]
    pub fn new(inner: Arc<H>) -> Self {
        Self {
            inner,
            _event: PhantomData,
        }
    }
}

impl<T, H: std::fmt::Debug> std::fmt::Debug for TypedHandler<T, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypedHandler").field(&self.inner).finish()
    }
}

#[async_trait]
impl<T, H> IntegrationEventHandler for TypedHandler<T, H>
where
    T: IntegrationEvent,
    H: Handles<T>,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn event_name(&self) -> &'static str {
        T::NAME
    }

    fn event_version(&self) -> i16 {
        T::VERSION
    }

    async fn handle(&self, envelope: &serde_json::Value) -> Result<(), EventError> {
        let typed: EventEnvelope<T> = serde_json::from_value(envelope.clone())?;
        self.inner.handle(&typed).await
    }
}

/// A consuming module's subscription: the logical queue it consumes from,
/// the wildcard-capable topic patterns it binds, and the handlers it runs.
pub struct Subscription {
    /// Logical queue name, e.g. `inventory`.
    pub queue: String,
    /// Topic patterns, e.g. `materials.*.v1`.
    pub bindings: Vec<String>,
    /// The module's integration-event handlers.
    pub handlers: Vec<Arc<dyn IntegrationEventHandler>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("queue", &self.queue)
            .field("bindings", &self.bindings)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::envelope::WrapOptions;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    struct VarnishAppliedV1 {
        project_id: Uuid,
    }

    impl IntegrationEvent for VarnishAppliedV1 {
        const NAME: &'static str = "projects.varnish-applied";
        const VERSION: i16 = 1;
    }

    #[derive(Debug, Default)]
    struct Spy {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Handles<VarnishAppliedV1> for Spy {
        fn name(&self) -> &'static str {
            "spy"
        }

        async fn handle(
            &self,
            _envelope: &EventEnvelope<VarnishAppliedV1>,
        ) -> Result<(), EventError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_typed_handler_decodes_and_delegates() {
        let spy = Arc::new(Spy::default());
        let erased = TypedHandler::new(spy.clone());
        assert_eq!(erased.event_name(), "projects.varnish-applied");
        assert_eq!(erased.event_version(), 1);

        let envelope = EventEnvelope::wrap(
            VarnishAppliedV1 {
                project_id: Uuid::new_v4(),
            },
            WrapOptions {
                tenant_id: "t1".into(),
                username: "freya".into(),
                correlation_id: Uuid::new_v4(),
                causation_id: None,
                trace: None,
            },
            &SystemClock,
        );
        let value = serde_json::to_value(&envelope).unwrap();

        erased.handle(&value).await.unwrap();
        assert_eq!(spy.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_mismatched_payload() {
        let erased = TypedHandler::<VarnishAppliedV1, _>::new(Arc::new(Spy::default()));
        let garbage = serde_json::json!({"payload": {"nope": true}});
        assert!(matches!(
            erased.handle(&garbage).await,
            Err(EventError::Serialization(_))
        ));
    }
}
