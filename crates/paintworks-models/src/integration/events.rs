//! Integration events published by the Models module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paintworks_core::error::EventError;
use paintworks_core::event::IntegrationEvent;
use paintworks_core::registry::EventTypeRegistryBuilder;

/// A model was added to the catalog. Version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCreatedV1 {
    /// The new model's identifier.
    pub model_id: Uuid,
    /// Display name.
    pub name: String,
    /// Franchise or range, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub franchise: Option<String>,
    /// Scale, if known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scale: Option<String>,
    /// Creation time.
    pub created_utc: DateTime<Utc>,
}

impl IntegrationEvent for ModelCreatedV1 {
    const NAME: &'static str = "models.model-created";
    const VERSION: i16 = 1;
}

/// A model received a rating. Version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRatedV1 {
    /// The rated model.
    pub model_id: Uuid,
    /// The rating value (1..=5).
    pub rating: u8,
    /// Average rating after this one was applied.
    pub new_average: f64,
}

impl IntegrationEvent for ModelRatedV1 {
    const NAME: &'static str = "models.model-rated";
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
    builder.register::<ModelCreatedV1>()?;
    builder.register::<ModelRatedV1>()?;
    Ok(())
}
