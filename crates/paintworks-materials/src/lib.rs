//! Paintworks — Materials module.
//!
//! Owns paints, primers, resins, and other consumables. Raises thin domain
//! events on mutation and translates them into the versioned
//! `materials.*` integration events consumed by other modules.

pub mod application;
pub mod domain;
pub mod integration;

pub use integration::events::register_event_types;
