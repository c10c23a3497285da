//! Routes for the Materials module.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paintworks_materials::application::command_handlers::{
    MaterialCommandResult, handle_change_material_price, handle_create_material,
};
use paintworks_materials::domain::commands::{ChangeMaterialPrice, CreateMaterial};

use crate::context::CallerContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Body for POST /api/v1/materials.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialRequest {
    /// Display name.
    pub name: String,
    /// Purchase unit, e.g. `ml`.
    pub unit: String,
    /// Price per unit.
    pub price_per_unit: f64,
}

/// Body for POST /api/v1/materials/{id}/price.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePriceRequest {
    /// The new price per unit.
    pub new_price_per_unit: f64,
}

/// Response for Materials commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCommandResponse {
    /// The affected material.
    pub material_id: Uuid,
    /// Integration events staged to the outbox by this command.
    pub staged_event_ids: Vec<Uuid>,
}

impl From<MaterialCommandResult> for MaterialCommandResponse {
    fn from(result: MaterialCommandResult) -> Self {
        Self {
            material_id: result.material_id,
            staged_event_ids: result.staged_event_ids,
        }
    }
}

/// POST /api/v1/materials
async fn create_material(
    State(state): State<AppState>,
    context: CallerContext,
    Json(body): Json<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<MaterialCommandResponse>), ApiError> {
    let result = handle_create_material(
        &state.db_pool,
        state.clock.as_ref(),
        &state.material_dispatcher,
        context.0,
        CreateMaterial {
            name: body.name,
            unit: body.unit,
            price_per_unit: body.price_per_unit,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /api/v1/materials/{id}/price
async fn change_price(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
    context: CallerContext,
    Json(body): Json<ChangePriceRequest>,
) -> Result<Json<MaterialCommandResponse>, ApiError> {
    let result = handle_change_material_price(
        &state.db_pool,
        state.clock.as_ref(),
        &state.material_dispatcher,
        context.0,
        ChangeMaterialPrice {
            material_id,
            new_price_per_unit: body.new_price_per_unit,
        },
    )
    .await?;
    Ok(Json(result.into()))
}

/// Returns the router for the Materials module.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_material))
        .route("/{id}/price", post(change_price))
}
