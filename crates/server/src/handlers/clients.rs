use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::ApiResponse;
use models::client;
use service::actor::Actor;
use service::client_service::{self, CreateClientInput, UpdateClientInput};

use crate::auth::ServerState;
use crate::errors::ApiError;

// query structs stay flat: serde_urlencoded cannot drive #[serde(flatten)]
// over numeric fields
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveInput {
    pub active: bool,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<client::Model>>>, ApiError> {
    let page = Pagination::from_parts(q.page, q.per_page);
    let clients = client_service::list_clients(&state.db, q.active_only, page).await?;
    Ok(Json(ApiResponse::ok(clients)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let c = client_service::get_client(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(c)))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateClientInput>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let c = client_service::create_client(&state.db, &actor, input).await?;
    Ok(Json(ApiResponse::ok(c)))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateClientInput>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let c = client_service::update_client(&state.db, &actor, id, input).await?;
    Ok(Json(ApiResponse::ok(c)))
}

pub async fn set_active(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<ActiveInput>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let c = client_service::set_client_active(&state.db, &actor, id, input.active).await?;
    Ok(Json(ApiResponse::ok(c)))
}
