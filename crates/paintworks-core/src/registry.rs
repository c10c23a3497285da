//! Event type registry: `(name, version)` → payload type.
//!
//! The registry is an explicitly constructed, immutable lookup table owned by
//! the application's composition root. Each module contributes its event
//! types through a registration function at startup; there is no runtime
//! scanning and no global state, and the catalog is verifiable in one place.

use std::collections::HashMap;

use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::IntegrationEvent;

/// One registered event type: its wire identity, the Rust type behind it,
/// and a decode hook that validates a serialized envelope against that type.
pub struct EventDescriptor {
    name: &'static str,
    version: i16,
    type_name: &'static str,
    decode: fn(&serde_json::Value) -> Result<(), serde_json::Error>,
}

impl EventDescriptor {
    /// The stable event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The event schema version.
    #[must_use]
    pub fn version(&self) -> i16 {
        self.version
    }

    /// The registered Rust type's name (diagnostics only; never serialized).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Validates that `envelope` deserializes as this type's envelope.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Serialization` if the envelope does not match
    /// the registered payload shape.
    pub fn check_envelope(&self, envelope: &serde_json::Value) -> Result<(), EventError> {
        (self.decode)(envelope)?;
        Ok(())
    }
}

impl std::fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

fn decode_as<T: IntegrationEvent>(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    serde_json::from_value::<EventEnvelope<T>>(value.clone()).map(|_| ())
}

/// Builder for the immutable [`EventTypeRegistry`].
#[derive(Debug, Default)]
pub struct EventTypeRegistryBuilder {
    entries: HashMap<(String, i16), EventDescriptor>,
}

impl EventTypeRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an integration event type under its `(NAME, VERSION)` key.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DuplicateEventType` if another type already
    /// claimed the same key. A silent collision would route one module's
    /// payloads into another's decoder, so registration fails fast instead.
    pub fn register<T: IntegrationEvent>(&mut self) -> Result<&mut Self, EventError> {
        let key = (T::NAME.to_owned(), T::VERSION);
        if self.entries.contains_key(&key) {
            return Err(EventError::DuplicateEventType {
                name: T::NAME.to_owned(),
                version: T::VERSION,
            });
        }
        self.entries.insert(
            key,
            EventDescriptor {
                name: T::NAME,
                version: T::VERSION,
                type_name: std::any::type_name::<T>(),
                decode: decode_as::<T>,
            },
        );
        Ok(self)
    }

    /// Finalizes the catalog into an immutable registry.
    #[must_use]
    pub fn build(self) -> EventTypeRegistry {
        EventTypeRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable `(name, version)` → [`EventDescriptor`] lookup table.
///
/// Built once at startup; lookups are O(1) and the table never changes at
/// runtime (new event types require a restart).
#[derive(Debug)]
pub struct EventTypeRegistry {
    entries: HashMap<(String, i16), EventDescriptor>,
}

impl EventTypeRegistry {
    /// Looks up the descriptor for a wire `(name, version)` pair.
    #[must_use]
    pub fn resolve(&self, name: &str, version: i16) -> Option<&EventDescriptor> {
        self.entries.get(&(name.to_owned(), version))
    }

    /// Number of registered event types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
