//! Thin-to-thick translation for Models domain events.

use std::sync::Arc;

use async_trait::async_trait;

use paintworks_core::clock::Clock;
use paintworks_core::dispatch::DomainEventHandler;
use paintworks_core::envelope::EventEnvelope;
use paintworks_core::error::EventError;
use paintworks_core::outbox::OutboxBatch;

use crate::domain::events::ModelEvent;
use crate::integration::events::{ModelCreatedV1, ModelRatedV1};

/// Translates Models domain events into their integration projections.
pub struct ModelEventTranslator {
    clock: Arc<dyn Clock>,
}

impl ModelEventTranslator {
    /// Creates the translator.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl std::fmt::Debug for ModelEventTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEventTranslator").finish_non_exhaustive()
    }
}

#[async_trait]
impl DomainEventHandler<ModelEvent> for ModelEventTranslator {
    fn name(&self) -> &'static str {
        "model-event-translator"
    }

    async fn handle(
        &self,
        envelope: &EventEnvelope<ModelEvent>,
        batch: &mut OutboxBatch,
    ) -> Result<(), EventError> {
        match &envelope.payload {
            ModelEvent::Created(created) => {
                let integration = ModelCreatedV1 {
                    model_id: created.model_id,
                    name: created.name.clone(),
                    franchise: created.franchise.clone(),
                    scale: created.scale.clone(),
                    created_utc: created.created_utc,
                };
                batch.push(&envelope.child(integration, self.clock.as_ref()))?;
            }
            ModelEvent::Rated(rated) => {
                let integration = ModelRatedV1 {
                    model_id: rated.model_id,
                    rating: rated.rating,
                    new_average: rated.new_average,
                };
                batch.push(&envelope.child(integration, self.clock.as_ref()))?;
            }
        }
        Ok(())
    }
}
