use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use common::pagination::Pagination;
use common::types::ApiResponse;
use models::audit_log;
use service::actor::Actor;
use service::audit_service;

use crate::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub entity: String,
    pub entity_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<AuditQuery>,
) -> Result<Json<ApiResponse<Vec<audit_log::Model>>>, ApiError> {
    let page = Pagination::from_parts(q.page, q.per_page);
    let rows =
        audit_service::list_for_entity(&state.db, &actor, &q.entity, q.entity_id.as_deref(), page)
            .await?;
    Ok(Json(ApiResponse::ok(rows)))
}
