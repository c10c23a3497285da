//! Commands for the Materials module.

use uuid::Uuid;

/// Create a new material.
#[derive(Debug, Clone)]
pub struct CreateMaterial {
    /// Display name, e.g. "Resin A".
    pub name: String,
    /// Purchase unit, e.g. "ml".
    pub unit: String,
    /// Price per unit.
    pub price_per_unit: f64,
}

/// Change an existing material's price.
#[derive(Debug, Clone)]
pub struct ChangeMaterialPrice {
    /// The material to reprice.
    pub material_id: Uuid,
    /// The new price per unit.
    pub new_price_per_unit: f64,
}
