//! Domain events for the Models module.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use paintworks_core::event::DomainEvent;

/// A model was added to the catalog.
#[derive(Debug, Clone)]
pub struct ModelCreated {
    /// The new model's identifier.
    pub model_id: Uuid,
    /// Display name.
    pub name: String,
    /// Franchise or range, if any.
    pub franchise: Option<String>,
    /// Scale, e.g. "1:35" or "28mm".
    pub scale: Option<String>,
    /// Creation time.
    pub created_utc: DateTime<Utc>,
}

/// A model received a rating.
#[derive(Debug, Clone)]
pub struct ModelRated {
    /// The rated model.
    pub model_id: Uuid,
    /// The rating value (1..=5).
    pub rating: u8,
    /// Average rating after this one was applied.
    pub new_average: f64,
}

/// The Models module's domain event.
#[derive(Debug, Clone)]
pub enum ModelEvent {
    /// A model was added to the catalog.
    Created(ModelCreated),
    /// A model received a rating.
    Rated(ModelRated),
}

impl DomainEvent for ModelEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ModelEvent::Created(_) => "models.model-created",
            ModelEvent::Rated(_) => "models.model-rated",
        }
    }
}
