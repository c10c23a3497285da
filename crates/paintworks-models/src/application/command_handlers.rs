//! Command handlers for the Models module.
//!
//! Same transactional shape as Materials: mutate, dispatch, stage the
//! outbox batch, commit as one unit.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use paintworks_core::clock::Clock;
use paintworks_core::dispatch::DomainDispatcher;
use paintworks_core::envelope::{EventEnvelope, WrapOptions};
use paintworks_core::error::DomainError;
use paintworks_core::outbox::OutboxBatch;
use paintworks_outbox::writer::insert_outbox_batch;

use crate::domain::commands::{CreateModel, RateModel};
use crate::domain::events::ModelEvent;
use crate::domain::model::Model;

/// Result of a successfully handled Models command.
#[derive(Debug)]
pub struct ModelCommandResult {
    /// The affected model.
    pub model_id: Uuid,
    /// Ids of the integration events staged to the outbox.
    pub staged_event_ids: Vec<Uuid>,
}

fn infra(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

/// Handles `CreateModel`: inserts the row, dispatches `ModelEvent::Created`,
/// and co-commits the staged outbox rows.
///
/// # Errors
///
/// Returns `DomainError::Validation` for bad input, or the dispatch/
/// persistence error that aborted the transaction.
pub async fn handle_create_model(
    pool: &PgPool,
    clock: &dyn Clock,
    dispatcher: &DomainDispatcher<ModelEvent>,
    context: WrapOptions,
    command: CreateModel,
) -> Result<ModelCommandResult, DomainError> {
    let (model, event) = Model::create(
        context.tenant_id.clone(),
        command.name,
        command.franchise,
        command.scale,
        clock,
    )?;

    let mut tx = pool.begin().await.map_err(infra)?;

    sqlx::query(
        r"
        INSERT INTO models (id, tenant_id, name, franchise, scale, rating_sum, rating_count, created_utc)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ",
    )
    .bind(model.id)
    .bind(&model.tenant_id)
    .bind(&model.name)
    .bind(&model.franchise)
    .bind(&model.scale)
    .bind(model.rating_sum)
    .bind(model.rating_count)
    .bind(model.created_utc)
    .execute(&mut *tx)
    .await
    .map_err(infra)?;

    let envelope = EventEnvelope::wrap(event, context, clock);
    let mut batch = OutboxBatch::new();
    dispatcher.dispatch(&envelope, &mut batch).await?;
    let staged_event_ids = batch.messages().iter().map(|m| m.id).collect();
    insert_outbox_batch(&mut tx, &batch).await?;

    tx.commit().await.map_err(infra)?;
    tracing::info!(model_id = %model.id, "model created");

    Ok(ModelCommandResult {
        model_id: model.id,
        staged_event_ids,
    })
}

/// Handles `RateModel`: loads the model, applies the rating, and co-commits
/// the new rating tally with the staged outbox rows.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the model does not exist in the
/// caller's tenant, `DomainError::Validation` for an out-of-range rating, or
/// the dispatch/persistence error that aborted the transaction.
pub async fn handle_rate_model(
    pool: &PgPool,
    clock: &dyn Clock,
    dispatcher: &DomainDispatcher<ModelEvent>,
    context: WrapOptions,
    command: RateModel,
) -> Result<ModelCommandResult, DomainError> {
    let mut tx = pool.begin().await.map_err(infra)?;

    let row = sqlx::query(
        r"
        SELECT id, tenant_id, name, franchise, scale, rating_sum, rating_count, created_utc
        FROM models
        WHERE id = $1 AND tenant_id = $2
        FOR UPDATE
        ",
    )
    .bind(command.model_id)
    .bind(&context.tenant_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(infra)?
    .ok_or(DomainError::NotFound {
        entity: "model",
        id: command.model_id,
    })?;

    let mut model = Model {
        id: row.try_get("id").map_err(infra)?,
        tenant_id: row.try_get("tenant_id").map_err(infra)?,
        name: row.try_get("name").map_err(infra)?,
        franchise: row.try_get("franchise").map_err(infra)?,
        scale: row.try_get("scale").map_err(infra)?,
        rating_sum: row.try_get("rating_sum").map_err(infra)?,
        rating_count: row.try_get("rating_count").map_err(infra)?,
        created_utc: row.try_get("created_utc").map_err(infra)?,
    };
    let event = model.rate(command.rating)?;

    sqlx::query("UPDATE models SET rating_sum = $2, rating_count = $3 WHERE id = $1")
        .bind(model.id)
        .bind(model.rating_sum)
        .bind(model.rating_count)
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

    let envelope = EventEnvelope::wrap(event, context, clock);
    let mut batch = OutboxBatch::new();
    dispatcher.dispatch(&envelope, &mut batch).await?;
    let staged_event_ids = batch.messages().iter().map(|m| m.id).collect();
    insert_outbox_batch(&mut tx, &batch).await?;

    tx.commit().await.map_err(infra)?;
    tracing::info!(model_id = %model.id, rating = command.rating, "model rated");

    Ok(ModelCommandResult {
        model_id: model.id,
        staged_event_ids,
    })
}
