//! Integration events published by the Materials module.
//!
//! Deliberately thick: each event carries everything a consumer needs, so no
//! consumer ever reaches back into this module's tables. Only primitives and
//! value types appear here — never the module's entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paintworks_core::error::EventError;
use paintworks_core::event::IntegrationEvent;
use paintworks_core::registry::EventTypeRegistryBuilder;

/// A material was created. Version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCreatedV1 {
    /// The new material's identifier.
    pub material_id: Uuid,
    /// Display name.
    pub name: String,
    /// Purchase unit.
    pub unit: String,
    /// Price per unit at creation.
    pub price_per_unit: f64,
    /// Creation time.
    pub created_utc: DateTime<Utc>,
}

impl IntegrationEvent for MaterialCreatedV1 {
    const NAME: &'static str = "materials.material-created";
    const VERSION: i16 = 1;
}

/// A material's price changed. Version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPriceChangedV1 {
    /// The repriced material.
    pub material_id: Uuid,
    /// Price before the change.
    pub old_price_per_unit: f64,
    /// Price after the change.
    pub new_price_per_unit: f64,
}

impl IntegrationEvent for MaterialPriceChangedV1 {
    const NAME: &'static str = "materials.material-price-changed";
    const VERSION: i16 = 1;
}

/// Registers this module's event catalog with the composition root's
/// registry builder.
///
/// # Errors
///
/// Returns `EventError::DuplicateEventType` if another module already
/// claimed one of these keys.
pub fn register_event_types(builder: &mut EventTypeRegistryBuilder) -> Result<(), EventError> {
    builder.register::<MaterialCreatedV1>()?;
    builder.register::<MaterialPriceChangedV1>()?;
    Ok(())
}
