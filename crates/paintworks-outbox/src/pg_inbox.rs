//! `PostgreSQL` implementation of the `InboxStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use paintworks_core::error::EventError;
use paintworks_core::outbox::InboxStore;

/// PostgreSQL-backed inbox store.
#[derive(Debug, Clone)]
pub struct PgInboxStore {
    pool: PgPool,
}

impl PgInboxStore {
    /// Creates a new `PgInboxStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(e: sqlx::Error) -> EventError {
    EventError::Store(e.to_string())
}

#[async_trait]
impl InboxStore for PgInboxStore {
    async fn already_processed(
        &self,
        event_id: Uuid,
        handler_name: &str,
    ) -> Result<bool, EventError> {
        let row = sqlx::query(
            r"
            SELECT EXISTS (
                SELECT 1 FROM inbox_messages
                WHERE event_id = $1 AND handler_name = $2
            ) AS present
            ",
        )
        .bind(event_id)
        .bind(handler_name)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.try_get("present").map_err(store_err)
    }

    async fn record_processed(
        &self,
        event_id: Uuid,
        handler_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EventError> {
        // ON CONFLICT makes a duplicate record a no-op rather than an error,
        // matching at-least-once delivery semantics.
        sqlx::query(
            r"
            INSERT INTO inbox_messages (event_id, handler_name, processed_utc, attempts)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (event_id, handler_name) DO NOTHING
            ",
        )
        .bind(event_id)
        .bind(handler_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}
