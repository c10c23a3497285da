//! Commands for the Models module.

use uuid::Uuid;

/// Add a model to the catalog.
#[derive(Debug, Clone)]
pub struct CreateModel {
    /// Display name.
    pub name: String,
    /// Franchise or range, if any.
    pub franchise: Option<String>,
    /// Scale, if known.
    pub scale: Option<String>,
}

/// Rate an existing model.
#[derive(Debug, Clone)]
pub struct RateModel {
    /// The model to rate.
    pub model_id: Uuid,
    /// The rating value (1..=5).
    pub rating: u8,
}
