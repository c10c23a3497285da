//! `PostgreSQL` implementation of the `OutboxStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use paintworks_core::error::EventError;
use paintworks_core::outbox::{OutboxMessage, OutboxStats, OutboxStore};

/// PostgreSQL-backed outbox store.
#[derive(Debug, Clone)]
pub struct PgOutboxStore {
    pool: PgPool,
}

impl PgOutboxStore {
    /// Creates a new `PgOutboxStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &PgRow) -> Result<OutboxMessage, sqlx::Error> {
    Ok(OutboxMessage {
        id: row.try_get("id")?,
        event_name: row.try_get("event_name")?,
        event_version: row.try_get("event_version")?,
        payload: row.try_get("payload")?,
        created_utc: row.try_get("created_utc")?,
        processed_utc: row.try_get("processed_utc")?,
        do_not_process_before_utc: row.try_get("do_not_process_before_utc")?,
        attempts: row.try_get("attempts")?,
    })
}

fn store_err(e: sqlx::Error) -> EventError {
    EventError::Store(e.to_string())
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn claim_due(
        &self,
        batch_size: u32,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboxMessage>, EventError> {
        // Claim-and-lease in one statement: SKIP LOCKED keeps concurrent
        // publisher instances off the same rows during the scan, and the
        // lease stamp keeps them off between this call and mark_processed.
        // A crashed claimant's rows become due again once the lease passes.
        let rows = sqlx::query(
            r"
            WITH due AS (
                SELECT id
                FROM outbox_integration_events
                WHERE processed_utc IS NULL
                  AND (do_not_process_before_utc IS NULL OR do_not_process_before_utc <= $1)
                ORDER BY created_utc
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE outbox_integration_events AS o
            SET do_not_process_before_utc = $3
            FROM due
            WHERE o.id = due.id
            RETURNING o.id, o.event_name, o.event_version, o.payload,
                      o.created_utc, o.processed_utc, o.do_not_process_before_utc,
                      o.attempts
            ",
        )
        .bind(now)
        .bind(i64::from(batch_size))
        .bind(now + lease)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut messages = rows
            .iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)?;
        // RETURNING does not guarantee scan order; restore FIFO by creation.
        messages.sort_by_key(|m| m.created_utc);
        Ok(messages)
    }

    async fn mark_processed(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), EventError> {
        sqlx::query(
            r"
            UPDATE outbox_integration_events
            SET processed_utc = $2
            WHERE id = $1 AND processed_utc IS NULL
            ",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, retry_at: DateTime<Utc>) -> Result<(), EventError> {
        sqlx::query(
            r"
            UPDATE outbox_integration_events
            SET attempts = attempts + 1,
                do_not_process_before_utc = $2
            WHERE id = $1 AND processed_utc IS NULL
            ",
        )
        .bind(id)
        .bind(retry_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn stats(&self) -> Result<OutboxStats, EventError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS unprocessed_count,
                   MIN(created_utc) AS oldest_unprocessed_utc
            FROM outbox_integration_events
            WHERE processed_utc IS NULL
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(OutboxStats {
            unprocessed_count: row.try_get("unprocessed_count").map_err(store_err)?,
            oldest_unprocessed_utc: row.try_get("oldest_unprocessed_utc").map_err(store_err)?,
        })
    }
}
