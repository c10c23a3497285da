//! In-memory outbox and inbox stores mirroring the Postgres semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use paintworks_core::error::EventError;
use paintworks_core::outbox::{InboxStore, OutboxMessage, OutboxStats, OutboxStore};

/// An outbox store over a `Vec`, with the same claim-and-lease behavior as
/// the Postgres implementation: due rows are stamped with the lease when
/// claimed, so repeated claims within the lease window return nothing.
#[derive(Debug, Default)]
pub struct InMemoryOutboxStore {
    rows: Mutex<Vec<OutboxMessage>>,
}

impl InMemoryOutboxStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a message, as a committed business transaction would.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, message: OutboxMessage) {
        self.rows.lock().unwrap().push(message);
    }

    /// Snapshot of a row by id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<OutboxMessage> {
        self.rows.lock().unwrap().iter().find(|m| m.id == id).cloned()
    }

    /// Snapshot of every row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn all(&self) -> Vec<OutboxMessage> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn claim_due(
        &self,
        batch_size: u32,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboxMessage>, EventError> {
        let mut rows = self.rows.lock().unwrap();
        let mut due: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                m.processed_utc.is_none()
                    && m.do_not_process_before_utc.is_none_or(|t| t <= now)
            })
            .map(|(i, _)| i)
            .collect();
        due.sort_by_key(|&i| rows[i].created_utc);
        due.truncate(batch_size as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for i in due {
            rows[i].do_not_process_before_utc = Some(now + lease);
            claimed.push(rows[i].clone());
        }
        Ok(claimed)
    }

    async fn mark_processed(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), EventError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|m| m.id == id && m.processed_utc.is_none()) {
            row.processed_utc = Some(now);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, retry_at: DateTime<Utc>) -> Result<(), EventError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|m| m.id == id && m.processed_utc.is_none()) {
            row.attempts += 1;
            row.do_not_process_before_utc = Some(retry_at);
        }
        Ok(())
    }

    async fn stats(&self) -> Result<OutboxStats, EventError> {
        let rows = self.rows.lock().unwrap();
        let pending: Vec<_> = rows.iter().filter(|m| m.processed_utc.is_none()).collect();
        #[allow(clippy::cast_possible_wrap)]
        Ok(OutboxStats {
            unprocessed_count: pending.len() as i64,
            oldest_unprocessed_utc: pending.iter().map(|m| m.created_utc).min(),
        })
    }
}

/// An inbox store over a `HashMap` keyed by `(event_id, handler_name)`.
#[derive(Debug, Default)]
pub struct InMemoryInboxStore {
    entries: Mutex<HashMap<(Uuid, String), DateTime<Utc>>>,
}

impl InMemoryInboxStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded `(event_id, handler_name)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl InboxStore for InMemoryInboxStore {
    async fn already_processed(
        &self,
        event_id: Uuid,
        handler_name: &str,
    ) -> Result<bool, EventError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.contains_key(&(event_id, handler_name.to_owned())))
    }

    async fn record_processed(
        &self,
        event_id: Uuid,
        handler_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EventError> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry((event_id, handler_name.to_owned()))
            .or_insert(now);
        Ok(())
    }
}
