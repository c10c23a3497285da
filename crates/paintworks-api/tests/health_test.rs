//! Integration tests for the health endpoints and header contract.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Duration;
use paintworks_core::clock::Clock;
use paintworks_core::outbox::OutboxMessage;
use paintworks_test_support::InMemoryOutboxStore;
use uuid::Uuid;

fn pending_message(created_utc: chrono::DateTime<chrono::Utc>) -> OutboxMessage {
    OutboxMessage {
        id: Uuid::new_v4(),
        event_name: "materials.material-created".to_owned(),
        event_version: 1,
        payload: serde_json::json!({"payload": {}}),
        created_utc,
        processed_utc: None,
        do_not_process_before_utc: None,
        attempts: 0,
    }
}

#[tokio::test]
async fn test_health_reports_ok_and_version() {
    let app = common::build_test_app(Arc::new(InMemoryOutboxStore::new()), common::fixed_clock());

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_outbox_health_empty_backlog() {
    let clock = common::fixed_clock();
    let app = common::build_test_app(Arc::new(InMemoryOutboxStore::new()), clock.clone());

    let (status, json) = common::get_json(app, "/health/outbox").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["unprocessedCount"], 0);
    assert!(json["oldestUnprocessedAgeSeconds"].is_null());
    assert_eq!(json["nowUtc"], clock.now().to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true));
}

#[tokio::test]
async fn test_outbox_health_reports_backlog_age() {
    let clock = common::fixed_clock();
    let outbox = Arc::new(InMemoryOutboxStore::new());
    outbox.insert(pending_message(clock.now() - Duration::seconds(90)));
    outbox.insert(pending_message(clock.now() - Duration::seconds(10)));

    let app = common::build_test_app(outbox, clock);
    let (status, json) = common::get_json(app, "/health/outbox").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["unprocessedCount"], 2);
    assert_eq!(json["oldestUnprocessedAgeSeconds"], 90);
}

#[tokio::test]
async fn test_missing_tenant_header_is_rejected() {
    let app = common::build_test_app(Arc::new(InMemoryOutboxStore::new()), common::fixed_clock());

    let (status, json) = common::post_json(
        app,
        "/api/v1/materials",
        &[],
        &serde_json::json!({"name": "Resin A", "unit": "ml", "pricePerUnit": 0.12}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_blank_model_name_is_rejected_before_persistence() {
    // Validation fires before the command touches the (lazy, unconnected)
    // pool, so a blank name must come back 400 rather than 500.
    let app = common::build_test_app(Arc::new(InMemoryOutboxStore::new()), common::fixed_clock());

    let (status, json) = common::post_json(
        app,
        "/api/v1/models",
        &[("x-tenant-id", "studio-7"), ("x-username", "freya")],
        &serde_json::json!({"name": "   "}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}
