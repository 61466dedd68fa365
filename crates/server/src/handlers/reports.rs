use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::ApiResponse;
use models::client_report;
use service::actor::Actor;
use service::report_service::{self, CreateReportInput, ReportFilter};
use service::request_service::{CreateRequestInput, RequestView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::realtime::events;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub client_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

#[derive(Serialize)]
pub struct ConvertOutput {
    pub report: client_report::Model,
    pub request: RequestView,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<client_report::Model>>>, ApiError> {
    let filter = ReportFilter { client_id: q.client_id, status: q.status };
    let page = Pagination::from_parts(q.page, q.per_page);
    let rows = report_service::list_reports(&state.db, filter, page).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateReportInput>,
) -> Result<Json<ApiResponse<client_report::Model>>, ApiError> {
    let report = report_service::create_report(&state.db, &actor, input).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn update_status(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusInput>,
) -> Result<Json<ApiResponse<client_report::Model>>, ApiError> {
    let report = report_service::update_status(&state.db, &actor, id, &input.status).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// Convert a report into a request; the new request is announced like any
/// other creation.
pub async fn convert(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateRequestInput>,
) -> Result<Json<ApiResponse<ConvertOutput>>, ApiError> {
    let (report, outcome) = report_service::convert_to_request(&state.db, &actor, id, input).await?;
    state.hub.broadcast(&json!({
        "type": events::REQUEST_CREATED,
        "request_id": outcome.request.id,
        "state": outcome.request.state,
        "data": outcome.request,
    }));
    state.hub.push_notifications(&outcome.notifications);
    Ok(Json(ApiResponse::ok(ConvertOutput { report, request: outcome.request.into() })))
}
