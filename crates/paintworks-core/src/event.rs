//! Domain and integration event traits.
//!
//! Every business fact exists as two distinct types: a thin in-process
//! domain event raised by the owning module, and a thick self-contained
//! integration event published across module boundaries. A translation
//! handler sits between them; the two roles never share a type.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Thin in-process fact raised by a module during a state transition.
///
/// Domain events never cross a module boundary and are never serialized for
/// the broker; they exist only within the unit of work that raised them.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Stable dotted identifier for logging and handler routing,
    /// e.g. `materials.material-created`.
    fn event_type(&self) -> &'static str;
}

/// Thick, versioned, self-contained projection of a domain event meant for
/// cross-module consumption.
///
/// Integration events carry only primitives and value types — never a
/// module's internal aggregate types — so consumers stay decoupled from the
/// producer's internals. The `(NAME, VERSION)` pair is the event's stable
/// identity on the wire; the Rust type name never leaks into storage or
/// broker messages.
pub trait IntegrationEvent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable dotted event name, e.g. `materials.material-created`.
    const NAME: &'static str;

    /// Schema version of this event shape.
    const VERSION: i16;

    /// Broker topic this event is published under.
    #[must_use]
    fn topic() -> String {
        format!("{}.v{}", Self::NAME, Self::VERSION)
    }
}

/// Renders the broker topic for a stored `(name, version)` pair.
#[must_use]
pub fn topic_for(name: &str, version: i16) -> String {
    format!("{name}.v{version}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct SampleCreatedV1 {
        id: u32,
    }

    impl IntegrationEvent for SampleCreatedV1 {
        const NAME: &'static str = "samples.sample-created";
        const VERSION: i16 = 1;
    }

    #[test]
    fn test_topic_derives_from_name_and_version() {
        assert_eq!(SampleCreatedV1::topic(), "samples.sample-created.v1");
        assert_eq!(
            topic_for("materials.material-created", 2),
            "materials.material-created.v2"
        );
    }
}
