//! The Material entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use paintworks_core::clock::Clock;
use paintworks_core::error::DomainError;

use super::events::{MaterialCreated, MaterialEvent, MaterialPriceChanged};

/// A purchasable material: paint, primer, resin, and the like.
#[derive(Debug, Clone)]
pub struct Material {
    /// Identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: String,
    /// Display name.
    pub name: String,
    /// Purchase unit.
    pub unit: String,
    /// Price per unit.
    pub price_per_unit: f64,
    /// Creation time.
    pub created_utc: DateTime<Utc>,
}

impl Material {
    /// Creates a new material, returning the entity and the domain event it
    /// raised.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or the price
    /// is negative or non-finite.
    pub fn create(
        tenant_id: String,
        name: String,
        unit: String,
        price_per_unit: f64,
        clock: &dyn Clock,
    ) -> Result<(Self, MaterialEvent), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("material name must not be blank".into()));
        }
        validate_price(price_per_unit)?;

        let material = Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            unit,
            price_per_unit,
            created_utc: clock.now(),
        };
        let event = MaterialEvent::Created(MaterialCreated {
            material_id: material.id,
            name: material.name.clone(),
            unit: material.unit.clone(),
            price_per_unit: material.price_per_unit,
            created_utc: material.created_utc,
        });
        Ok((material, event))
    }

    /// Changes the price, returning the domain event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the new price is negative or
    /// non-finite.
    pub fn change_price(&mut self, new_price_per_unit: f64) -> Result<MaterialEvent, DomainError> {
        validate_price(new_price_per_unit)?;
        let event = MaterialEvent::PriceChanged(MaterialPriceChanged {
            material_id: self.id,
            old_price_per_unit: self.price_per_unit,
            new_price_per_unit,
        });
        self.price_per_unit = new_price_per_unit;
        Ok(event)
    }
}

fn validate_price(price: f64) -> Result<(), DomainError> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::Validation(format!(
            "price per unit must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use paintworks_test_support::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_create_raises_created_event() {
        let clock = clock();
        let (material, event) = Material::create(
            "studio-7".into(),
            "Resin A".into(),
            "ml".into(),
            0.12,
            &clock,
        )
        .unwrap();

        assert_eq!(material.created_utc, clock.now());
        match event {
            MaterialEvent::Created(created) => {
                assert_eq!(created.material_id, material.id);
                assert_eq!(created.name, "Resin A");
                assert!((created.price_per_unit - 0.12).abs() < f64::EPSILON);
            }
            MaterialEvent::PriceChanged(_) => panic!("expected Created"),
        }
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let err = Material::create("t".into(), "  ".into(), "ml".into(), 1.0, &clock()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_change_price_records_old_and_new() {
        let (mut material, _) =
            Material::create("t".into(), "Resin A".into(), "ml".into(), 0.12, &clock()).unwrap();
        let event = material.change_price(0.15).unwrap();
        match event {
            MaterialEvent::PriceChanged(changed) => {
                assert!((changed.old_price_per_unit - 0.12).abs() < f64::EPSILON);
                assert!((changed.new_price_per_unit - 0.15).abs() < f64::EPSILON);
            }
            MaterialEvent::Created(_) => panic!("expected PriceChanged"),
        }
        assert!((material.price_per_unit - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_change_price_rejects_negative() {
        let (mut material, _) =
            Material::create("t".into(), "Resin A".into(), "ml".into(), 0.12, &clock()).unwrap();
        assert!(material.change_price(-1.0).is_err());
        assert!(material.change_price(f64::NAN).is_err());
    }
}
