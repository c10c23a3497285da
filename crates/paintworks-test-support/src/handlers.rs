//! Test integration-event handlers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use paintworks_core::error::EventError;
use paintworks_core::integration::IntegrationEventHandler;

/// A handler that records every envelope it is given and always succeeds.
#[derive(Debug)]
pub struct RecordingIntegrationHandler {
    name: &'static str,
    event_name: &'static str,
    event_version: i16,
    envelopes: Mutex<Vec<serde_json::Value>>,
}

impl RecordingIntegrationHandler {
    /// Creates a recording handler for the given event key.
    #[must_use]
    pub fn new(name: &'static str, event_name: &'static str, event_version: i16) -> Self {
        Self {
            name,
            event_name,
            event_version,
            envelopes: Mutex::new(Vec::new()),
        }
    }

    /// Number of envelopes handled so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.envelopes.lock().unwrap().len()
    }

    /// Snapshot of the handled envelopes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn envelopes(&self) -> Vec<serde_json::Value> {
        self.envelopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntegrationEventHandler for RecordingIntegrationHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn event_name(&self) -> &'static str {
        self.event_name
    }

    fn event_version(&self) -> i16 {
        self.event_version
    }

    async fn handle(&self, envelope: &serde_json::Value) -> Result<(), EventError> {
        self.envelopes.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// A handler that fails its first `fail_times` invocations, then succeeds.
/// Useful for exercising redelivery and inbox idempotency.
#[derive(Debug)]
pub struct FailingIntegrationHandler {
    name: &'static str,
    event_name: &'static str,
    event_version: i16,
    fail_times: usize,
    attempts: AtomicUsize,
}

impl FailingIntegrationHandler {
    /// Creates a handler that fails the first `fail_times` invocations.
    #[must_use]
    pub fn new(
        name: &'static str,
        event_name: &'static str,
        event_version: i16,
        fail_times: usize,
    ) -> Self {
        Self {
            name,
            event_name,
            event_version,
            fail_times,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Total invocations so far, failures included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntegrationEventHandler for FailingIntegrationHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn event_name(&self) -> &'static str {
        self.event_name
    }

    fn event_version(&self) -> i16 {
        self.event_version
    }

    async fn handle(&self, _envelope: &serde_json::Value) -> Result<(), EventError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_times {
            return Err(EventError::Handler {
                handler: self.name.to_owned(),
                reason: format!("simulated failure on attempt {}", attempt + 1),
            });
        }
        Ok(())
    }
}
