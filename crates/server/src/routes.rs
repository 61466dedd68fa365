use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use common::types::Health;

use crate::auth::{self, ServerState};
use crate::handlers::{audit, billing, categories, clients, notifications, reports, requests, stats, users};
use crate::realtime;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public auth/health/ws plus the
/// bearer-protected `/api` surface.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/ws", get(realtime::ws_handler))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let api = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::get).put(users::update).delete(users::deactivate))
        .route("/api/clients", get(clients::list).post(clients::create))
        .route("/api/clients/:id", get(clients::get).put(clients::update))
        .route("/api/clients/:id/active", put(clients::set_active))
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/:id",
            get(categories::get).put(categories::update).delete(categories::remove),
        )
        .route("/api/requests", get(requests::list).post(requests::create))
        .route("/api/requests/history", get(requests::history))
        .route("/api/requests/:id", get(requests::get))
        .route("/api/requests/:id/accept", post(requests::accept))
        .route("/api/requests/:id/pause", post(requests::pause))
        .route("/api/requests/:id/resume", post(requests::resume))
        .route("/api/requests/:id/resolve", post(requests::resolve))
        .route("/api/requests/:id/cancel", post(requests::cancel))
        .route("/api/stats/:user_id/:year/:month", get(stats::get_month))
        .route("/api/stats/:user_id/:year/:month/recompute", post(stats::recompute))
        .route("/api/billing/:client_id", get(billing::list_for_client))
        .route("/api/billing/:client_id/:year/:month", get(billing::get_month))
        .route("/api/billing/:client_id/:year/:month/close", post(billing::close))
        .route("/api/billing/:client_id/:year/:month/invoice", post(billing::invoice))
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route("/api/reports", get(reports::list).post(reports::create))
        .route("/api/reports/:id/status", put(reports::update_status))
        .route("/api/reports/:id/convert", post(reports::convert))
        .route("/api/audit", get(audit::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
