//! Bearer-JWT authentication: register/login/me handlers plus the middleware
//! that turns an `Authorization` header into an [`Actor`] request extension.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use common::types::ApiResponse;
use service::actor::Actor;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::auth::token;

use crate::errors::ApiError;
use crate::realtime::Hub;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub hub: Arc<Hub>,
}

#[derive(Serialize)]
pub struct RegisterOutput {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub user: AuthUser,
}

pub(crate) fn auth_service(state: &ServerState) -> AuthService<SeaOrmAuthRepository> {
    AuthService::new(
        Arc::new(SeaOrmAuthRepository { db: state.db.clone() }),
        AuthConfig {
            jwt_secret: Some(state.auth.jwt_secret.clone()),
            token_ttl_hours: state.auth.token_ttl_hours,
            password_algorithm: "argon2".into(),
        },
    )
}

fn bearer_actor(state: &ServerState, headers: &HeaderMap) -> Result<Actor, ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;
    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("expected a bearer token"))?;
    let claims = token::verify(&state.auth.jwt_secret, token)?;
    Ok(claims.actor()?)
}

/// Create a user with credentials. Admin-gated, except for the very first
/// user of an empty install (bootstrap).
pub async fn register(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<RegisterInput>,
) -> Result<Json<ApiResponse<RegisterOutput>>, ApiError> {
    let user_count = models::user::Entity::find()
        .count(&state.db)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if user_count > 0 {
        let actor = bearer_actor(&state, &headers)?;
        if !actor.is_admin() {
            return Err(ApiError::new(StatusCode::FORBIDDEN, "only admins can register users"));
        }
    } else {
        info!("bootstrap registration on empty install");
    }

    let user = auth_service(&state).register(input).await?;
    Ok(Json(ApiResponse::ok(RegisterOutput { user_id: user.id })))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<ApiResponse<LoginOutput>>, ApiError> {
    let session = auth_service(&state).login(input).await?;
    let token = session
        .token
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;
    Ok(Json(ApiResponse::ok(LoginOutput { token, user: session.user })))
}

pub async fn me(Extension(actor): Extension<Actor>) -> Json<ApiResponse<Actor>> {
    Json(ApiResponse::ok(actor))
}

/// Middleware for protected routes: verify the bearer token and stash the
/// actor in the request extensions.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = bearer_actor(&state, req.headers())?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
