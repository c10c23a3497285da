//! Event envelope: identity, tenancy, causality, and trace propagation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;

/// W3C-style trace propagation fields carried across the broker so consumer
/// spans join the producer's trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TraceContext {
    /// The distributed trace identifier.
    pub trace_id: String,
    /// The span active when the event was wrapped.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_span_id: Option<String>,
    /// Sampling flags.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace_flags: Option<String>,
    /// Vendor-specific trace state.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace_state: Option<String>,
}

/// Context supplied by the caller when wrapping a payload.
///
/// Everything except the event id and timestamp, which the factory mints
/// itself.
#[derive(Debug, Clone)]
pub struct WrapOptions {
    /// The tenant on whose behalf the event was raised.
    pub tenant_id: String,
    /// The acting username.
    pub username: String,
    /// Correlation id threading through the causal chain.
    pub correlation_id: Uuid,
    /// The event (or command) that caused this one, if any.
    pub causation_id: Option<Uuid>,
    /// Trace propagation fields, if a trace is active.
    pub trace: Option<TraceContext>,
}

/// Metadata wrapper around an event payload.
///
/// The envelope identity (`event_id`) is unique and immutable once created;
/// `correlation_id` threads unchanged through a causal chain while
/// `causation_id` points one step back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<T> {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// The tenant partition this event belongs to.
    pub tenant_id: String,
    /// The acting username.
    pub username: String,
    /// Correlation id shared by every event in the causal chain.
    pub correlation_id: Uuid,
    /// The direct cause of this event, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub causation_id: Option<Uuid>,
    /// Envelope creation time (UTC).
    pub created_utc: DateTime<Utc>,
    /// Trace propagation fields, flattened into the envelope body.
    #[serde(flatten)]
    pub trace: Option<TraceContext>,
    /// The wrapped event payload.
    pub payload: T,
}

impl<T> EventEnvelope<T> {
    /// Wraps a payload, minting a fresh unique event id and stamping the
    /// current UTC time from `clock`.
    #[must_use]
    pub fn wrap(payload: T, options: WrapOptions, clock: &dyn Clock) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            tenant_id: options.tenant_id,
            username: options.username,
            correlation_id: options.correlation_id,
            causation_id: options.causation_id,
            created_utc: clock.now(),
            trace: options.trace,
            payload,
        }
    }

    /// Wraps a payload caused by this envelope's event: fresh id and
    /// timestamp, same tenant/user/correlation/trace, causation pointing at
    /// this envelope.
    ///
    /// This is the translation step — a domain-event handler derives the
    /// integration-event envelope from the domain envelope it received.
    #[must_use]
    pub fn child<U>(&self, payload: U, clock: &dyn Clock) -> EventEnvelope<U> {
        EventEnvelope {
            event_id: Uuid::new_v4(),
            tenant_id: self.tenant_id.clone(),
            username: self.username.clone(),
            correlation_id: self.correlation_id,
            causation_id: Some(self.event_id),
            created_utc: clock.now(),
            trace: self.trace.clone(),
            payload,
        }
    }
}

/// The frame published to the broker: the `(name, version)` identity the
/// consumer resolves against the registry, plus the serialized envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Stable event name.
    pub event_name: String,
    /// Event schema version.
    pub event_version: i16,
    /// The serialized `EventEnvelope<T>`.
    pub envelope: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn options() -> WrapOptions {
        WrapOptions {
            tenant_id: "studio-7".to_owned(),
            username: "freya".to_owned(),
            correlation_id: Uuid::new_v4(),
            causation_id: None,
            trace: None,
        }
    }

    #[test]
    fn test_wrap_mints_fresh_identity_and_timestamp() {
        let before = Utc::now();
        let a = EventEnvelope::wrap("payload", options(), &SystemClock);
        let b = EventEnvelope::wrap("payload", options(), &SystemClock);
        let after = Utc::now();

        assert_ne!(a.event_id, b.event_id);
        assert!(!a.event_id.is_nil());
        assert!(a.created_utc >= before && a.created_utc <= after);
    }

    #[test]
    fn test_child_threads_correlation_and_sets_causation() {
        let parent = EventEnvelope::wrap(1_u32, options(), &SystemClock);
        let child = parent.child("translated", &SystemClock);

        assert_ne!(child.event_id, parent.event_id);
        assert_eq!(child.correlation_id, parent.correlation_id);
        assert_eq!(child.causation_id, Some(parent.event_id));
        assert_eq!(child.tenant_id, parent.tenant_id);
        assert_eq!(child.username, parent.username);
    }

    #[test]
    fn test_wire_shape_is_camel_case_with_flattened_trace() {
        let mut opts = options();
        opts.trace = Some(TraceContext {
            trace_id: "0af7651916cd43dd8448eb211c80319c".to_owned(),
            parent_span_id: Some("b7ad6b7169203331".to_owned()),
            trace_flags: None,
            trace_state: None,
        });
        let envelope = EventEnvelope::wrap(serde_json::json!({"name": "Resin A"}), opts, &SystemClock);

        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("eventId").is_some());
        assert!(value.get("tenantId").is_some());
        assert!(value.get("correlationId").is_some());
        assert!(value.get("createdUtc").is_some());
        assert_eq!(value["traceId"], "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(value["parentSpanId"], "b7ad6b7169203331");
        // Absent optionals stay off the wire entirely.
        assert!(value.get("causationId").is_none());
        assert!(value.get("traceFlags").is_none());
    }

    #[test]
    fn test_envelope_round_trips_without_trace() {
        let envelope = EventEnvelope::wrap(serde_json::json!({"id": 3}), options(), &SystemClock);
        let json = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope<serde_json::Value> = serde_json::from_str(&json).unwrap();

        assert_eq!(back.event_id, envelope.event_id);
        assert_eq!(back.trace, None);
        assert_eq!(back.payload, envelope.payload);
    }
}
