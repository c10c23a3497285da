//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;

use paintworks_core::clock::Clock;
use paintworks_core::dispatch::DomainDispatcher;
use paintworks_core::outbox::OutboxStore;
use paintworks_materials::domain::events::MaterialEvent;
use paintworks_models::domain::events::ModelEvent;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Time source; swapped for a fixed clock under test.
    pub clock: Arc<dyn Clock>,
    /// Outbox store backing the health endpoint.
    pub outbox: Arc<dyn OutboxStore>,
    /// Domain dispatcher for the Materials module.
    pub material_dispatcher: Arc<DomainDispatcher<MaterialEvent>>,
    /// Domain dispatcher for the Models module.
    pub model_dispatcher: Arc<DomainDispatcher<ModelEvent>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock>,
        outbox: Arc<dyn OutboxStore>,
        material_dispatcher: Arc<DomainDispatcher<MaterialEvent>>,
        model_dispatcher: Arc<DomainDispatcher<ModelEvent>>,
    ) -> Self {
        Self {
            db_pool,
            clock,
            outbox,
            material_dispatcher,
            model_dispatcher,
        }
    }
}
