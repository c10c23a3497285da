//! Paintworks Core — shared event pipeline abstractions.
//!
//! This crate defines the envelope, event traits, type registry, outbox data
//! model, and domain dispatcher that every module depends on. It contains no
//! infrastructure code; the Postgres stores live in `paintworks-outbox` and
//! the broker/workers in `paintworks-messaging`.

pub mod clock;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod event;
pub mod integration;
pub mod outbox;
pub mod registry;
