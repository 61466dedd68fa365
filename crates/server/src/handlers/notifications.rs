use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use common::pagination::Pagination;
use common::types::ApiResponse;
use models::notification;
use service::actor::Actor;
use service::notification_service;

use crate::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
pub struct Inbox {
    pub unread: u64,
    pub items: Vec<notification::Model>,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiResponse<Inbox>>, ApiError> {
    let page = Pagination::from_parts(q.page, q.per_page);
    let items =
        notification_service::list_for_user(&state.db, actor.id, q.unread_only, page).await?;
    let unread = notification_service::unread_count(&state.db, actor.id).await?;
    Ok(Json(ApiResponse::ok(Inbox { unread, items })))
}

pub async fn mark_read(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<notification::Model>>, ApiError> {
    let n = notification_service::mark_read(&state.db, &actor, id).await?;
    Ok(Json(ApiResponse::ok(n)))
}

pub async fn mark_all_read(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    let updated = notification_service::mark_all_read(&state.db, actor.id).await?;
    Ok(Json(ApiResponse::ok_with_message("all notifications read", updated)))
}
