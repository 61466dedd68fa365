use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::ApiResponse;
use service::actor::Actor;
use service::auth::domain::RegisterInput;
use service::user_service::{self, UpdateUserInput, UserView};

use crate::auth::{self, ServerState};
use crate::errors::ApiError;

pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<UserView>>>, ApiError> {
    let users = user_service::list_users(&state.db, page).await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// Admin-only user creation with credentials.
pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "only admins can create users"));
    }
    let created = auth::auth_service(&state).register(input).await?;
    let view = user_service::get_user(&state.db, created.id).await?;
    Ok(Json(ApiResponse::ok(view)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = user_service::get_user(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = user_service::update_user(&state.db, &actor, id, input).await?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn deactivate(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user_service::deactivate_user(&state.db, &actor, id).await?;
    Ok(Json(ApiResponse::ok_with_message("user deactivated", ())))
}
