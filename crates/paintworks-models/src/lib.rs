//! Paintworks — Models module.
//!
//! Owns paintable models (miniatures, kits) and their community ratings.

pub mod application;
pub mod domain;
pub mod integration;

pub use integration::events::register_event_types;
