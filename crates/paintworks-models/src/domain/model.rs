//! The Model entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use paintworks_core::clock::Clock;
use paintworks_core::error::DomainError;

use super::events::{ModelCreated, ModelEvent, ModelRated};

/// A paintable model: a miniature, bust, or kit.
#[derive(Debug, Clone)]
pub struct Model {
    /// Identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: String,
    /// Display name.
    pub name: String,
    /// Franchise or range, if any.
    pub franchise: Option<String>,
    /// Scale, e.g. "1:35" or "28mm".
    pub scale: Option<String>,
    /// Sum of all ratings received.
    pub rating_sum: i64,
    /// Number of ratings received.
    pub rating_count: i64,
    /// Creation time.
    pub created_utc: DateTime<Utc>,
}

impl Model {
    /// Creates a new model, returning the entity and the domain event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank.
    pub fn create(
        tenant_id: String,
        name: String,
        franchise: Option<String>,
        scale: Option<String>,
        clock: &dyn Clock,
    ) -> Result<(Self, ModelEvent), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("model name must not be blank".into()));
        }
        let model = Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            franchise,
            scale,
            rating_sum: 0,
            rating_count: 0,
            created_utc: clock.now(),
        };
        let event = ModelEvent::Created(ModelCreated {
            model_id: model.id,
            name: model.name.clone(),
            franchise: model.franchise.clone(),
            scale: model.scale.clone(),
            created_utc: model.created_utc,
        });
        Ok((model, event))
    }

    /// Applies a rating, returning the domain event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `rating` is within 1..=5.
    pub fn rate(&mut self, rating: u8) -> Result<ModelEvent, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        self.rating_sum += i64::from(rating);
        self.rating_count += 1;
        #[allow(clippy::cast_precision_loss)]
        let new_average = self.rating_sum as f64 / self.rating_count as f64;
        Ok(ModelEvent::Rated(ModelRated {
            model_id: self.id,
            rating,
            new_average,
        }))
    }
}
