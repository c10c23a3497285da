//! Outbox and inbox data model and store traits.
//!
//! The outbox is a durable local queue co-committed with business data: the
//! mutation and its outbox rows commit atomically or neither does. The inbox
//! records `(event_id, handler_name)` pairs already applied by a consumer so
//! at-least-once delivery stays idempotent in effect.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::IntegrationEvent;

/// A persisted integration-event envelope pending (or past) publication.
///
/// Rows are append-only in the hot path: the publisher marks them processed
/// or schedules a retry, and nothing ever deletes them (retained for audit
/// and replay).
#[derive(Debug, Clone)]
pub struct OutboxMessage {
    /// Row id; equals the wrapped envelope's event id.
    pub id: Uuid,
    /// Stable event name, e.g. `materials.material-created`.
    pub event_name: String,
    /// Event schema version.
    pub event_version: i16,
    /// The serialized `EventEnvelope<T>`.
    pub payload: serde_json::Value,
    /// Insertion time (UTC); publication order within one table scan.
    pub created_utc: DateTime<Utc>,
    /// Set once the broker accepted the message. Null means pending; a
    /// message is either pending or terminally processed, never in between.
    pub processed_utc: Option<DateTime<Utc>>,
    /// Retry backoff / claim lease: the publisher skips the row until this
    /// passes.
    pub do_not_process_before_utc: Option<DateTime<Utc>>,
    /// Number of failed publish attempts so far.
    pub attempts: i32,
}

/// A recorded `(event_id, handler_name)` pair: this handler's effect has
/// been applied for this event.
#[derive(Debug, Clone)]
pub struct InboxEntry {
    /// The consumed envelope's event id.
    pub event_id: Uuid,
    /// The handler that processed it.
    pub handler_name: String,
    /// When the effect was recorded.
    pub processed_utc: DateTime<Utc>,
    /// Deliveries observed for this pair (1 on first processing).
    pub attempts: i32,
}

/// Operator-facing backlog numbers behind `GET /health/outbox`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutboxStats {
    /// Rows with `processed_utc IS NULL`.
    pub unprocessed_count: i64,
    /// Creation time of the oldest unprocessed row, if any.
    pub oldest_unprocessed_utc: Option<DateTime<Utc>>,
}

/// In-memory staging buffer for integration events raised inside one unit of
/// work.
///
/// Domain-event handlers push translated integration events here; the
/// command function then writes the whole batch into the outbox table inside
/// its own transaction, which is what makes the business mutation and the
/// outbox rows atomic.
#[derive(Debug, Default)]
pub struct OutboxBatch {
    messages: Vec<OutboxMessage>,
}

impl OutboxBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes an integration-event envelope and stages it, tagged with
    /// the event type's `(NAME, VERSION)` identity.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Serialization` if the envelope cannot be
    /// serialized.
    pub fn push<T: IntegrationEvent>(
        &mut self,
        envelope: &EventEnvelope<T>,
    ) -> Result<(), EventError> {
        let payload = serde_json::to_value(envelope)?;
        self.messages.push(OutboxMessage {
            id: envelope.event_id,
            event_name: T::NAME.to_owned(),
            event_version: T::VERSION,
            payload,
            created_utc: envelope.created_utc,
            processed_utc: None,
            do_not_process_before_utc: None,
            attempts: 0,
        });
        Ok(())
    }

    /// The staged messages, in push order.
    #[must_use]
    pub fn messages(&self) -> &[OutboxMessage] {
        &self.messages
    }

    /// Whether nothing was staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of staged messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

/// Store for pending integration-event rows.
///
/// Implementations back the publisher worker and the health endpoint. All
/// methods take `now` explicitly so backoff and stats are deterministic
/// under test.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Claims up to `batch_size` due rows, oldest first.
    ///
    /// Due means `processed_utc IS NULL` and any
    /// `do_not_process_before_utc` has passed. Claiming stamps a short
    /// `lease` onto `do_not_process_before_utc` atomically, so concurrent
    /// publisher instances never hand the same row to the broker twice; if
    /// the claimant crashes before marking the row, the lease expires and
    /// the row is claimed again (at-least-once, not at-most-once).
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` on persistence failure.
    async fn claim_due(
        &self,
        batch_size: u32,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboxMessage>, EventError>;

    /// Terminally marks a row processed.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` on persistence failure.
    async fn mark_processed(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), EventError>;

    /// Records a failed attempt: bumps the attempt count and schedules the
    /// next try at `retry_at`. The row is never deleted.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` on persistence failure.
    async fn mark_failed(&self, id: Uuid, retry_at: DateTime<Utc>) -> Result<(), EventError>;

    /// Backlog numbers for the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` on persistence failure.
    async fn stats(&self) -> Result<OutboxStats, EventError>;
}

/// Store for processed `(event_id, handler_name)` pairs.
#[async_trait]
pub trait InboxStore: Send + Sync {
    /// Whether this handler already applied this event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` on persistence failure.
    async fn already_processed(
        &self,
        event_id: Uuid,
        handler_name: &str,
    ) -> Result<bool, EventError>;

    /// Records that the handler applied the event. Recording an existing
    /// pair is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Store` on persistence failure.
    async fn record_processed(
        &self,
        event_id: Uuid,
        handler_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EventError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::envelope::WrapOptions;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct BrushWornV1 {
        brush_id: Uuid,
    }

    impl IntegrationEvent for BrushWornV1 {
        const NAME: &'static str = "materials.brush-worn";
        const VERSION: i16 = 1;
    }

    #[test]
    fn test_push_tags_message_with_event_identity() {
        let envelope = EventEnvelope::wrap(
            BrushWornV1 {
                brush_id: Uuid::new_v4(),
            },
            WrapOptions {
                tenant_id: "t1".into(),
                username: "loki".into(),
                correlation_id: Uuid::new_v4(),
                causation_id: None,
                trace: None,
            },
            &SystemClock,
        );

        let mut batch = OutboxBatch::new();
        batch.push(&envelope).unwrap();

        assert_eq!(batch.len(), 1);
        let message = &batch.messages()[0];
        assert_eq!(message.id, envelope.event_id);
        assert_eq!(message.event_name, "materials.brush-worn");
        assert_eq!(message.event_version, 1);
        assert_eq!(message.created_utc, envelope.created_utc);
        assert!(message.processed_utc.is_none());
        assert_eq!(message.attempts, 0);
        assert_eq!(message.payload["eventId"], envelope.event_id.to_string());
    }
}
