//! Thin-to-thick translation for Materials domain events.
//!
//! Runs inside the business transaction as a domain-event handler: each thin
//! fact becomes a versioned, self-contained integration event staged on the
//! outbox batch. The translated envelope is a child of the domain envelope,
//! so correlation threads through and causation points back at the domain
//! event.

use std::sync::Arc;

use async_trait::async_trait;

use paintworks_core::clock::Clock;
use paintworks_core::dispatch::DomainEventHandler;
use paintworks_core::envelope::EventEnvelope;
use paintworks_core::error::EventError;
use paintworks_core::outbox::OutboxBatch;

use crate::domain::events::MaterialEvent;
use crate::integration::events::{MaterialCreatedV1, MaterialPriceChangedV1};

/// Translates Materials domain events into their integration projections.
pub struct MaterialEventTranslator {
    clock: Arc<dyn Clock>,
}

impl MaterialEventTranslator {
    /// Creates the translator.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl std::fmt::Debug for MaterialEventTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialEventTranslator").finish_non_exhaustive()
    }
}

#[async_trait]
impl DomainEventHandler<MaterialEvent> for MaterialEventTranslator {
    fn name(&self) -> &'static str {
        "material-event-translator"
    }

    async fn handle(
        &self,
        envelope: &EventEnvelope<MaterialEvent>,
        batch: &mut OutboxBatch,
    ) -> Result<(), EventError> {
        match &envelope.payload {
            MaterialEvent::Created(created) => {
                let integration = MaterialCreatedV1 {
                    material_id: created.material_id,
                    name: created.name.clone(),
                    unit: created.unit.clone(),
                    price_per_unit: created.price_per_unit,
                    created_utc: created.created_utc,
                };
                batch.push(&envelope.child(integration, self.clock.as_ref()))?;
            }
            MaterialEvent::PriceChanged(changed) => {
                let integration = MaterialPriceChangedV1 {
                    material_id: changed.material_id,
                    old_price_per_unit: changed.old_price_per_unit,
                    new_price_per_unit: changed.new_price_per_unit,
                };
                batch.push(&envelope.child(integration, self.clock.as_ref()))?;
            }
        }
        Ok(())
    }
}
