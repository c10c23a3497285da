//! Stock projection handlers.
//!
//! Each handler applies one materials event to the `inventory_stock` table.
//! Handlers are retried on failure and replayed on redelivery, so every
//! statement is written to be idempotent on its own: the inbox guard in the
//! consumer is the first line of defense, the upsert is the second.

use async_trait::async_trait;
use sqlx::PgPool;

use paintworks_core::envelope::EventEnvelope;
use paintworks_core::error::EventError;
use paintworks_core::integration::Handles;
use paintworks_materials::integration::events::{MaterialCreatedV1, MaterialPriceChangedV1};

fn infra(e: sqlx::Error) -> EventError {
    EventError::Store(e.to_string())
}

/// Seeds a stock row when a material is created.
pub struct MaterialCreatedProjector {
    pool: PgPool,
}

impl MaterialCreatedProjector {
    /// Creates the projector.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Handles<MaterialCreatedV1> for MaterialCreatedProjector {
    fn name(&self) -> &'static str {
        "inventory.material-created-projector"
    }

    async fn handle(&self, envelope: &EventEnvelope<MaterialCreatedV1>) -> Result<(), EventError> {
        let event = &envelope.payload;
        sqlx::query(
            r"
            INSERT INTO inventory_stock
                (material_id, tenant_id, name, unit, price_per_unit, quantity, updated_utc)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            ON CONFLICT (material_id) DO UPDATE
            SET name = EXCLUDED.name,
                unit = EXCLUDED.unit,
                price_per_unit = EXCLUDED.price_per_unit,
                updated_utc = EXCLUDED.updated_utc
            ",
        )
        .bind(event.material_id)
        .bind(&envelope.tenant_id)
        .bind(&event.name)
        .bind(&event.unit)
        .bind(event.price_per_unit)
        .bind(envelope.created_utc)
        .execute(&self.pool)
        .await
        .map_err(infra)?;

        tracing::debug!(material_id = %event.material_id, "stock row seeded");
        Ok(())
    }
}

/// Reprices the stock row when a material's price changes.
pub struct MaterialPriceChangedProjector {
    pool: PgPool,
}

impl MaterialPriceChangedProjector {
    /// Creates the projector.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Handles<MaterialPriceChangedV1> for MaterialPriceChangedProjector {
    fn name(&self) -> &'static str {
        "inventory.material-price-changed-projector"
    }

    async fn handle(
        &self,
        envelope: &EventEnvelope<MaterialPriceChangedV1>,
    ) -> Result<(), EventError> {
        let event = &envelope.payload;
        // The created event may not have been applied yet; an out-of-order
        // reprice is a no-op and the created handler carries the price.
        sqlx::query(
            r"
            UPDATE inventory_stock
            SET price_per_unit = $2, updated_utc = $3
            WHERE material_id = $1
            ",
        )
        .bind(event.material_id)
        .bind(event.new_price_per_unit)
        .bind(envelope.created_utc)
        .execute(&self.pool)
        .await
        .map_err(infra)?;

        tracing::debug!(
            material_id = %event.material_id,
            new_price = event.new_price_per_unit,
            "stock repriced"
        );
        Ok(())
    }
}
