use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::ApiResponse;
use models::request_history;
use service::actor::Actor;
use service::request_service::{
    self, ArchiveOutcome, CreateRequestInput, RequestFilter, RequestOutcome, RequestView,
};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::realtime::events;

// query structs stay flat: serde_urlencoded cannot drive #[serde(flatten)]
// over numeric fields
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub state: Option<String>,
    pub client_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub client_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn push_outcome(state: &ServerState, outcome: &RequestOutcome, event: &str) {
    state.hub.broadcast(&json!({
        "type": event,
        "request_id": outcome.request.id,
        "state": outcome.request.state,
        "data": outcome.request,
    }));
    state.hub.push_notifications(&outcome.notifications);
}

fn push_archive(state: &ServerState, outcome: &ArchiveOutcome) {
    state.hub.broadcast(&json!({
        "type": events::REQUEST_STATE,
        "request_id": outcome.history.origin_request_id,
        "state": outcome.history.final_state,
        "data": outcome.history,
    }));
    state.hub.push_notifications(&outcome.notifications);
}

pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<RequestView>>>, ApiError> {
    let filter = RequestFilter { state: q.state, client_id: q.client_id, assignee_id: q.assignee_id };
    let page = Pagination::from_parts(q.page, q.per_page);
    let rows = request_service::list_requests(&state.db, filter, page).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestView>>, ApiError> {
    let view = request_service::get_request(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(view)))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateRequestInput>,
) -> Result<Json<ApiResponse<RequestView>>, ApiError> {
    let outcome = request_service::create_request(&state.db, &actor, input).await?;
    push_outcome(&state, &outcome, events::REQUEST_CREATED);
    Ok(Json(ApiResponse::ok(outcome.request.into())))
}

pub async fn accept(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestView>>, ApiError> {
    let outcome = request_service::accept_request(&state.db, &actor, id).await?;
    push_outcome(&state, &outcome, events::REQUEST_STATE);
    Ok(Json(ApiResponse::ok(outcome.request.into())))
}

pub async fn pause(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestView>>, ApiError> {
    let outcome = request_service::pause_request(&state.db, &actor, id).await?;
    push_outcome(&state, &outcome, events::REQUEST_STATE);
    Ok(Json(ApiResponse::ok(outcome.request.into())))
}

pub async fn resume(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestView>>, ApiError> {
    let outcome = request_service::resume_request(&state.db, &actor, id).await?;
    push_outcome(&state, &outcome, events::REQUEST_STATE);
    Ok(Json(ApiResponse::ok(outcome.request.into())))
}

pub async fn resolve(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<request_history::Model>>, ApiError> {
    let outcome = request_service::resolve_request(&state.db, &actor, id).await?;
    push_archive(&state, &outcome);
    Ok(Json(ApiResponse::ok(outcome.history)))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<request_history::Model>>, ApiError> {
    let outcome = request_service::cancel_request(&state.db, &actor, id).await?;
    push_archive(&state, &outcome);
    Ok(Json(ApiResponse::ok(outcome.history)))
}

pub async fn history(
    State(state): State<ServerState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<request_history::Model>>>, ApiError> {
    let page = Pagination::from_parts(q.page, q.per_page);
    let rows = request_service::list_history(&state.db, q.client_id, page).await?;
    Ok(Json(ApiResponse::ok(rows)))
}
