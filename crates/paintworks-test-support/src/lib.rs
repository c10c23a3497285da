//! Shared test mocks and utilities for the Paintworks event pipeline.

mod clock;
mod handlers;
mod stores;

pub use clock::FixedClock;
pub use handlers::{FailingIntegrationHandler, RecordingIntegrationHandler};
pub use stores::{InMemoryInboxStore, InMemoryOutboxStore};
