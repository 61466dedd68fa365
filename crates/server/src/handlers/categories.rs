use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::ApiResponse;
use models::category;
use service::actor::Actor;
use service::category_service::{self, CreateCategoryInput, UpdateCategoryInput};

use crate::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub area: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<category::Model>>>, ApiError> {
    let page = Pagination::from_parts(q.page, q.per_page);
    let cats = category_service::list_categories(&state.db, q.area.as_deref(), page).await?;
    Ok(Json(ApiResponse::ok(cats)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let cat = category_service::get_category(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(cat)))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let cat = category_service::create_category(&state.db, &actor, input).await?;
    Ok(Json(ApiResponse::ok(cat)))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let cat = category_service::update_category(&state.db, &actor, id, input).await?;
    Ok(Json(ApiResponse::ok(cat)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    category_service::delete_category(&state.db, &actor, id).await?;
    Ok(Json(ApiResponse::ok_with_message("category deleted", ())))
}
