//! Paintworks Messaging — broker abstraction and background workers.
//!
//! [`broker`] defines the topic pub/sub seam and ships an in-memory broker
//! for local runs and tests. [`publisher`] polls the outbox and pushes
//! pending envelopes to the broker; [`consumer`] subscribes a module's queue
//! and drives its handlers with inbox idempotency. Both workers stop through
//! a [`worker::WorkerHandle`].

pub mod backoff;
pub mod broker;
pub mod consumer;
pub mod publisher;
pub mod topic;
pub mod worker;
