//! Paintworks API server entry point and composition root.
//!
//! Builds the event type registry from every module's catalog (startup fails
//! fast on a duplicate `(name, version)`), wires the stores and dispatchers,
//! starts the outbox publisher and the inventory consumer, and serves the
//! HTTP API until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use paintworks_api::error::AppError;
use paintworks_api::state::AppState;
use paintworks_api::{routes, telemetry};
use paintworks_core::clock::SystemClock;
use paintworks_core::dispatch::DomainDispatcher;
use paintworks_core::outbox::{InboxStore, OutboxStore};
use paintworks_core::registry::EventTypeRegistryBuilder;
use paintworks_materials::application::translators::MaterialEventTranslator;
use paintworks_messaging::broker::{InMemoryBroker, MessageBroker};
use paintworks_messaging::consumer::{ConsumerConfig, IntegrationConsumer};
use paintworks_messaging::publisher::{OutboxPublisher, PublisherConfig};
use paintworks_models::application::translators::ModelEventTranslator;
use paintworks_outbox::pg_inbox::PgInboxStore;
use paintworks_outbox::pg_outbox::PgOutboxStore;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{name} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let tracer_provider = telemetry::init("paintworks-api")?;

    tracing::info!("Starting Paintworks API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env_parse("PORT", 3000)?;

    let publisher_config = PublisherConfig {
        poll_interval: std::time::Duration::from_millis(env_parse(
            "OUTBOX_POLL_INTERVAL_MS",
            1_000,
        )?),
        batch_size: env_parse("OUTBOX_BATCH_SIZE", 32)?,
        ..PublisherConfig::default()
    };

    // Create database connection pool and apply migrations.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    // Every module's event catalog feeds one registry; a duplicate
    // (name, version) aborts startup here rather than surfacing on consume.
    let mut builder = EventTypeRegistryBuilder::new();
    paintworks_materials::register_event_types(&mut builder)?;
    paintworks_models::register_event_types(&mut builder)?;
    let registry = Arc::new(builder.build());

    let clock = Arc::new(SystemClock);
    let outbox_store: Arc<dyn OutboxStore> = Arc::new(PgOutboxStore::new(pool.clone()));
    let inbox_store: Arc<dyn InboxStore> = Arc::new(PgInboxStore::new(pool.clone()));
    let broker: Arc<dyn MessageBroker> = Arc::new(InMemoryBroker::new());

    let material_dispatcher = Arc::new(DomainDispatcher::new(vec![Arc::new(
        MaterialEventTranslator::new(clock.clone()),
    )]));
    let model_dispatcher = Arc::new(DomainDispatcher::new(vec![Arc::new(
        ModelEventTranslator::new(clock.clone()),
    )]));

    // Background workers: one publisher for the outbox table, one consumer
    // per subscribing module.
    let publisher = Arc::new(OutboxPublisher::new(
        outbox_store.clone(),
        broker.clone(),
        clock.clone(),
        publisher_config,
    ));
    let publisher_handle = publisher.start();

    let inventory_consumer = IntegrationConsumer::new(
        registry.clone(),
        inbox_store,
        clock.clone(),
        paintworks_inventory::subscription(pool.clone()),
        ConsumerConfig::default(),
    );
    let inventory_handle = inventory_consumer.start(broker.as_ref()).await?;

    // Build application state and router.
    let app_state = AppState::new(
        pool,
        clock,
        outbox_store,
        material_dispatcher,
        model_dispatcher,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/materials", routes::materials::router())
        .nest("/api/v1/models", routes::models::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight work finish before the process exits.
    tracing::info!("Shutting down workers");
    publisher_handle.shutdown();
    publisher_handle.join().await;
    inventory_handle.shutdown();
    inventory_handle.join().await;
    if let Some(provider) = tracer_provider {
        let _ = provider.shutdown();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
