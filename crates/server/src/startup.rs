use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::auth::{ServerAuthConfig, ServerState};
use crate::realtime::Hub;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: &configs::AppConfig) -> anyhow::Result<SocketAddr> {
    let host = if cfg.server.host.trim().is_empty() {
        env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
    } else {
        cfg.server.host.clone()
    };
    Ok(format!("{}:{}", host, cfg.server.port).parse()?)
}

/// Public entry: connect, migrate, start the scheduler and serve HTTP.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_default();

    let cfg = configs::AppConfig::load_and_validate().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults + env");
        let mut cfg = configs::AppConfig::default();
        cfg.database.normalize_from_env();
        cfg.auth.normalize_from_env();
        cfg
    });

    let db = if cfg.database.url.trim().is_empty() {
        models::db::connect().await?
    } else {
        let db_cfg = models::db::DatabaseConfig::from(&cfg.database);
        models::db::connect_with_config(&db_cfg).await?
    };
    migration::Migrator::up(&db, None).await?;
    info!("database migrated");

    let scheduler = if cfg.scheduler.enabled {
        Some(scheduler::Scheduler::spawn(db.clone(), &cfg.scheduler)?)
    } else {
        info!("scheduler disabled by config");
        None
    };

    let jwt_secret = if cfg.auth.jwt_secret.trim().is_empty() {
        warn!("auth.jwt_secret empty, using dev default");
        "dev-secret-change-me".to_string()
    } else {
        cfg.auth.jwt_secret.clone()
    };
    let state = ServerState {
        db,
        auth: ServerAuthConfig { jwt_secret, token_ttl_hours: cfg.auth.token_ttl_hours },
        hub: Arc::new(Hub::new()),
    };

    let app: Router = routes::build_router(build_cors(), state);

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    if let Some(s) = scheduler {
        s.shutdown();
    }
    Ok(())
}
