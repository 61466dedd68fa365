use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use common::types::ApiResponse;
use models::user_statistic;
use service::actor::Actor;
use service::stats_service;

use crate::auth::ServerState;
use crate::errors::ApiError;

/// Read a user's month, computing it on first access. Users see their own
/// numbers; managers see everyone's.
pub async fn get_month(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path((user_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<ApiResponse<user_statistic::Model>>, ApiError> {
    if actor.id != user_id && !actor.is_manager() {
        return Err(service::errors::ServiceError::forbidden("read other users' statistics").into());
    }
    let row = stats_service::get_or_compute(&state.db, user_id, year, month).await?;
    Ok(Json(ApiResponse::ok(row)))
}

/// Force a recompute of one month.
pub async fn recompute(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path((user_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<ApiResponse<user_statistic::Model>>, ApiError> {
    if actor.id != user_id && !actor.is_manager() {
        return Err(service::errors::ServiceError::forbidden("recompute other users' statistics").into());
    }
    let row = stats_service::compute_for_user(&state.db, user_id, year, month).await?;
    Ok(Json(ApiResponse::ok_with_message("statistics recomputed", row)))
}
