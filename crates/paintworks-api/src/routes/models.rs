//! Routes for the Models module.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paintworks_models::application::command_handlers::{
    ModelCommandResult, handle_create_model, handle_rate_model,
};
use paintworks_models::domain::commands::{CreateModel, RateModel};

use crate::context::CallerContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Body for POST /api/v1/models.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelRequest {
    /// Display name.
    pub name: String,
    /// Franchise or range, if any.
    pub franchise: Option<String>,
    /// Scale, e.g. `1:35` or `28mm`.
    pub scale: Option<String>,
}

/// Body for POST /api/v1/models/{id}/rating.
#[derive(Debug, Deserialize)]
pub struct RateModelRequest {
    /// The rating value (1..=5).
    pub rating: u8,
}

/// Response for Models commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCommandResponse {
    /// The affected model.
    pub model_id: Uuid,
    /// Integration events staged to the outbox by this command.
    pub staged_event_ids: Vec<Uuid>,
}

impl From<ModelCommandResult> for ModelCommandResponse {
    fn from(result: ModelCommandResult) -> Self {
        Self {
            model_id: result.model_id,
            staged_event_ids: result.staged_event_ids,
        }
    }
}

/// POST /api/v1/models
async fn create_model(
    State(state): State<AppState>,
    context: CallerContext,
    Json(body): Json<CreateModelRequest>,
) -> Result<(StatusCode, Json<ModelCommandResponse>), ApiError> {
    let result = handle_create_model(
        &state.db_pool,
        state.clock.as_ref(),
        &state.model_dispatcher,
        context.0,
        CreateModel {
            name: body.name,
            franchise: body.franchise,
            scale: body.scale,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /api/v1/models/{id}/rating
async fn rate_model(
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
    context: CallerContext,
    Json(body): Json<RateModelRequest>,
) -> Result<Json<ModelCommandResponse>, ApiError> {
    let result = handle_rate_model(
        &state.db_pool,
        state.clock.as_ref(),
        &state.model_dispatcher,
        context.0,
        RateModel {
            model_id,
            rating: body.rating,
        },
    )
    .await?;
    Ok(Json(result.into()))
}

/// Returns the router for the Models module.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_model))
        .route("/{id}/rating", post(rate_model))
}
