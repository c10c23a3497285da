//! Paintworks Outbox — PostgreSQL outbox and inbox stores.
//!
//! [`writer`] inserts staged integration events inside the caller's own
//! transaction (the transactional-outbox half of the pattern);
//! [`pg_outbox`]/[`pg_inbox`] implement the store traits the background
//! workers and the health endpoint run against.

pub mod pg_inbox;
pub mod pg_outbox;
pub mod schema;
pub mod writer;
