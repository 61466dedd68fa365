use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use common::types::ApiResponse;
use models::billing_period;
use service::actor::Actor;
use service::billing_service;
use service::errors::ServiceError;

use crate::auth::ServerState;
use crate::errors::ApiError;

pub async fn list_for_client(
    State(state): State<ServerState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<billing_period::Model>>>, ApiError> {
    let rows = billing_service::list_for_client(&state.db, client_id).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// Read one month's period, generating it on first access.
pub async fn get_month(
    State(state): State<ServerState>,
    Path((client_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<ApiResponse<billing_period::Model>>, ApiError> {
    let row = billing_service::get_or_compute(&state.db, client_id, year, month).await?;
    Ok(Json(ApiResponse::ok(row)))
}

async fn resolve_period(
    state: &ServerState,
    client_id: Uuid,
    year: i32,
    month: u32,
) -> Result<billing_period::Model, ApiError> {
    billing_service::find_period(&state.db, client_id, year, month)
        .await?
        .ok_or_else(|| ServiceError::not_found("billing period").into())
}

pub async fn close(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path((client_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<ApiResponse<billing_period::Model>>, ApiError> {
    let period = resolve_period(&state, client_id, year, month).await?;
    let closed = billing_service::close_period(&state.db, &actor, period.id).await?;
    Ok(Json(ApiResponse::ok_with_message("billing period closed", closed)))
}

pub async fn invoice(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path((client_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<ApiResponse<billing_period::Model>>, ApiError> {
    let period = resolve_period(&state, client_id, year, month).await?;
    let invoiced = billing_service::invoice_period(&state.db, &actor, period.id).await?;
    Ok(Json(ApiResponse::ok_with_message("billing period invoiced", invoiced)))
}
