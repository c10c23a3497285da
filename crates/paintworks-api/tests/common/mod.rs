//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use paintworks_api::routes;
use paintworks_api::state::AppState;
use paintworks_core::clock::Clock;
use paintworks_core::dispatch::DomainDispatcher;
use paintworks_core::outbox::OutboxStore;
use paintworks_materials::application::translators::MaterialEventTranslator;
use paintworks_models::application::translators::ModelEventTranslator;
use paintworks_test_support::{FixedClock, InMemoryOutboxStore};

/// Fixed timestamp used across all integration tests.
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 8, 30, 10, 0, 0).unwrap(),
    ))
}

/// Build the app router over an in-memory outbox store and a lazy pool that
/// never connects. Uses the same route structure as `main.rs`; only tests
/// that stay out of the database belong here.
pub fn build_test_app(outbox: Arc<InMemoryOutboxStore>, clock: Arc<FixedClock>) -> Router {
    let pool = PgPool::connect_lazy("postgres://localhost/paintworks_test")
        .expect("lazy pool from static url");
    let clock: Arc<dyn Clock> = clock;
    let outbox: Arc<dyn OutboxStore> = outbox;

    let material_dispatcher = Arc::new(DomainDispatcher::new(vec![Arc::new(
        MaterialEventTranslator::new(clock.clone()),
    )]));
    let model_dispatcher = Arc::new(DomainDispatcher::new(vec![Arc::new(
        ModelEventTranslator::new(clock.clone()),
    )]));

    let app_state = AppState::new(pool, clock, outbox, material_dispatcher, model_dispatcher);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/materials", routes::materials::router())
        .nest("/api/v1/models", routes::models::router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and optional headers, returning the
/// response.
pub async fn post_json(
    app: Router,
    uri: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
