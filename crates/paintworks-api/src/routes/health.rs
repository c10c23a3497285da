//! Health check endpoints.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Outbox backlog snapshot.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxHealthResponse {
    /// Rows not yet accepted by the broker.
    pub unprocessed_count: i64,
    /// Age of the oldest pending row, if any.
    pub oldest_unprocessed_age_seconds: Option<i64>,
    /// Server time the snapshot was taken.
    pub now_utc: DateTime<Utc>,
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health/outbox
///
/// A growing `unprocessedCount` or climbing age means the publisher is down
/// or a message keeps failing; rows are never deleted, so stuck messages
/// stay visible here until an operator intervenes.
async fn outbox_health(
    State(state): State<AppState>,
) -> Result<Json<OutboxHealthResponse>, ApiError> {
    let stats = state.outbox.stats().await?;
    let now = state.clock.now();
    Ok(Json(OutboxHealthResponse {
        unprocessed_count: stats.unprocessed_count,
        oldest_unprocessed_age_seconds: stats
            .oldest_unprocessed_utc
            .map(|oldest| (now - oldest).num_seconds().max(0)),
        now_utc: now,
    }))
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/outbox", get(outbox_health))
}
