//! Paintworks — Inventory module.
//!
//! A pure consumer: it publishes nothing and keeps a denormalized stock
//! projection current by subscribing to the Materials module's integration
//! events. All coupling to Materials goes through the event contracts, never
//! its tables.

use std::sync::Arc;

use sqlx::PgPool;

use paintworks_core::integration::{Subscription, TypedHandler};

pub mod projections;

use projections::{MaterialCreatedProjector, MaterialPriceChangedProjector};

/// Queue this module consumes from.
pub const QUEUE: &str = "inventory";

/// Builds the module's subscription: queue, bindings, and handlers.
#[must_use]
pub fn subscription(pool: PgPool) -> Subscription {
    Subscription {
        queue: QUEUE.to_owned(),
        bindings: vec!["materials.*.v1".to_owned()],
        handlers: vec![
            Arc::new(TypedHandler::new(Arc::new(MaterialCreatedProjector::new(
                pool.clone(),
            )))),
            Arc::new(TypedHandler::new(Arc::new(
                MaterialPriceChangedProjector::new(pool),
            ))),
        ],
    }
}
