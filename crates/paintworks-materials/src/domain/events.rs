//! Domain events for the Materials module.
//!
//! These are the thin in-process facts; the thick cross-module projections
//! live in [`crate::integration::events`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

use paintworks_core::event::DomainEvent;

/// A material was created.
#[derive(Debug, Clone)]
pub struct MaterialCreated {
    /// The new material's identifier.
    pub material_id: Uuid,
    /// Display name, e.g. "Resin A".
    pub name: String,
    /// Purchase unit, e.g. "ml" or "pot".
    pub unit: String,
    /// Price per unit.
    pub price_per_unit: f64,
    /// Creation time.
    pub created_utc: DateTime<Utc>,
}

/// A material's price changed.
#[derive(Debug, Clone)]
pub struct MaterialPriceChanged {
    /// The material whose price changed.
    pub material_id: Uuid,
    /// Price before the change.
    pub old_price_per_unit: f64,
    /// Price after the change.
    pub new_price_per_unit: f64,
}

/// The Materials module's domain event.
#[derive(Debug, Clone)]
pub enum MaterialEvent {
    /// A material was created.
    Created(MaterialCreated),
    /// A material's price changed.
    PriceChanged(MaterialPriceChanged),
}

impl DomainEvent for MaterialEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MaterialEvent::Created(_) => "materials.material-created",
            MaterialEvent::PriceChanged(_) => "materials.material-price-changed",
        }
    }
}
