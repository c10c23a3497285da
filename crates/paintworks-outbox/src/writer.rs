//! Transactional outbox writer.
//!
//! The writer takes the caller's open transaction, so the business mutation
//! and its outbox rows commit atomically or neither does — there is no
//! dual-write window between the database and the broker.

use sqlx::{Postgres, Transaction};

use paintworks_core::error::EventError;
use paintworks_core::outbox::{OutboxBatch, OutboxMessage};

/// Inserts one staged integration event into the outbox inside `tx`.
///
/// # Errors
///
/// Returns `EventError::Store` if the insert fails.
pub async fn insert_outbox_message(
    tx: &mut Transaction<'_, Postgres>,
    message: &OutboxMessage,
) -> Result<(), EventError> {
    sqlx::query(
        r"
        INSERT INTO outbox_integration_events
            (id, event_name, event_version, payload, created_utc, attempts)
        VALUES ($1, $2, $3, $4, $5, 0)
        ",
    )
    .bind(message.id)
    .bind(&message.event_name)
    .bind(message.event_version)
    .bind(&message.payload)
    .bind(message.created_utc)
    .execute(&mut **tx)
    .await
    .map_err(|e| EventError::Store(e.to_string()))?;

    Ok(())
}

/// Inserts every message staged on `batch` into the outbox inside `tx`.
///
/// # Errors
///
/// Returns `EventError::Store` on the first failing insert; the caller's
/// rollback then discards any earlier rows along with the business mutation.
pub async fn insert_outbox_batch(
    tx: &mut Transaction<'_, Postgres>,
    batch: &OutboxBatch,
) -> Result<(), EventError> {
    for message in batch.messages() {
        insert_outbox_message(tx, message).await?;
    }
    tracing::debug!(staged = batch.len(), "outbox batch written to transaction");
    Ok(())
}
