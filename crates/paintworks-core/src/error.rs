//! Error types for the event pipeline and the business modules.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the event pipeline: registry, outbox, broker, handlers.
#[derive(Debug, Error)]
pub enum EventError {
    /// Two event types were registered under the same `(name, version)` key.
    #[error("duplicate event type registration: {name} v{version}")]
    DuplicateEventType {
        /// The colliding event name.
        name: String,
        /// The colliding event version.
        version: i16,
    },

    /// A consumed message declared a `(name, version)` the registry does not
    /// know. Non-fatal on the consume path; the message is dead-lettered.
    #[error("unknown event type: {name} v{version}")]
    UnknownEventType {
        /// The declared event name.
        name: String,
        /// The declared event version.
        version: i16,
    },

    /// Envelope or payload (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The outbox or inbox store failed.
    #[error("store error: {0}")]
    Store(String),

    /// The message broker rejected a publish, subscribe, or ack.
    #[error("broker error: {0}")]
    Broker(String),

    /// An event handler failed.
    #[error("handler {handler} failed: {reason}")]
    Handler {
        /// The failing handler's name.
        handler: String,
        /// The failure description.
        reason: String,
    },
}

/// Top-level error type for business module logic.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind.
        entity: &'static str,
        /// The missing entity's identifier.
        id: Uuid,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// A domain event handler or outbox write failed inside the business
    /// transaction. Aborts the originating request.
    #[error(transparent)]
    Event(#[from] EventError),
}
