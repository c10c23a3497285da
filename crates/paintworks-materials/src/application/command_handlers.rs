//! Command handlers for the Materials module.
//!
//! Each handler owns one transaction: persist the mutation, dispatch the
//! domain event (translators stage integration events on the batch), write
//! the batch to the outbox, commit. A failure anywhere rolls everything
//! back — the entity change and the outbox rows land together or not at all.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use paintworks_core::clock::Clock;
use paintworks_core::dispatch::DomainDispatcher;
use paintworks_core::envelope::{EventEnvelope, WrapOptions};
use paintworks_core::error::DomainError;
use paintworks_core::outbox::OutboxBatch;
use paintworks_outbox::writer::insert_outbox_batch;

use crate::domain::commands::{ChangeMaterialPrice, CreateMaterial};
use crate::domain::events::MaterialEvent;
use crate::domain::material::Material;

/// Result of a successfully handled Materials command.
#[derive(Debug)]
pub struct MaterialCommandResult {
    /// The affected material.
    pub material_id: Uuid,
    /// Ids of the integration events staged to the outbox.
    pub staged_event_ids: Vec<Uuid>,
}

fn infra(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

/// Handles `CreateMaterial`: inserts the row, dispatches
/// `MaterialEvent::Created`, and co-commits the staged outbox rows.
///
/// # Errors
///
/// Returns `DomainError::Validation` for bad input, or the dispatch/
/// persistence error that aborted the transaction.
pub async fn handle_create_material(
    pool: &PgPool,
    clock: &dyn Clock,
    dispatcher: &DomainDispatcher<MaterialEvent>,
    context: WrapOptions,
    command: CreateMaterial,
) -> Result<MaterialCommandResult, DomainError> {
    let (material, event) = Material::create(
        context.tenant_id.clone(),
        command.name,
        command.unit,
        command.price_per_unit,
        clock,
    )?;

    let mut tx = pool.begin().await.map_err(infra)?;

    sqlx::query(
        r"
        INSERT INTO materials (id, tenant_id, name, unit, price_per_unit, created_utc)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(material.id)
    .bind(&material.tenant_id)
    .bind(&material.name)
    .bind(&material.unit)
    .bind(material.price_per_unit)
    .bind(material.created_utc)
    .execute(&mut *tx)
    .await
    .map_err(infra)?;

    let envelope = EventEnvelope::wrap(event, context, clock);
    let mut batch = OutboxBatch::new();
    dispatcher.dispatch(&envelope, &mut batch).await?;
    let staged_event_ids = batch.messages().iter().map(|m| m.id).collect();
    insert_outbox_batch(&mut tx, &batch).await?;

    tx.commit().await.map_err(infra)?;
    tracing::info!(material_id = %material.id, "material created");

    Ok(MaterialCommandResult {
        material_id: material.id,
        staged_event_ids,
    })
}

/// Handles `ChangeMaterialPrice`: loads the material, applies the change,
/// and co-commits the update with the staged outbox rows.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the material does not exist in the
/// caller's tenant, or the dispatch/persistence error that aborted the
/// transaction.
pub async fn handle_change_material_price(
    pool: &PgPool,
    clock: &dyn Clock,
    dispatcher: &DomainDispatcher<MaterialEvent>,
    context: WrapOptions,
    command: ChangeMaterialPrice,
) -> Result<MaterialCommandResult, DomainError> {
    let mut tx = pool.begin().await.map_err(infra)?;

    let row = sqlx::query(
        r"
        SELECT id, tenant_id, name, unit, price_per_unit, created_utc
        FROM materials
        WHERE id = $1 AND tenant_id = $2
        FOR UPDATE
        ",
    )
    .bind(command.material_id)
    .bind(&context.tenant_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(infra)?
    .ok_or(DomainError::NotFound {
        entity: "material",
        id: command.material_id,
    })?;

    let mut material = Material {
        id: row.try_get("id").map_err(infra)?,
        tenant_id: row.try_get("tenant_id").map_err(infra)?,
        name: row.try_get("name").map_err(infra)?,
        unit: row.try_get("unit").map_err(infra)?,
        price_per_unit: row.try_get("price_per_unit").map_err(infra)?,
        created_utc: row.try_get("created_utc").map_err(infra)?,
    };
    let event = material.change_price(command.new_price_per_unit)?;

    sqlx::query("UPDATE materials SET price_per_unit = $2 WHERE id = $1")
        .bind(material.id)
        .bind(material.price_per_unit)
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

    let envelope = EventEnvelope::wrap(event, context, clock);
    let mut batch = OutboxBatch::new();
    dispatcher.dispatch(&envelope, &mut batch).await?;
    let staged_event_ids = batch.messages().iter().map(|m| m.id).collect();
    insert_outbox_batch(&mut tx, &batch).await?;

    tx.commit().await.map_err(infra)?;
    tracing::info!(material_id = %material.id, "material repriced");

    Ok(MaterialCommandResult {
        material_id: material.id,
        staged_event_ids,
    })
}
