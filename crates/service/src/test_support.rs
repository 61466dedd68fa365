#![cfg(test)]
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_init(|| async {
            let mut cfg = DatabaseConfig::from_file().unwrap_or_else(|_| DatabaseConfig::from_env());
            cfg.max_connections = cfg.max_connections.max(10);
            cfg.min_connections = cfg.min_connections.min(1);
            let db = connect_with_config(&cfg).await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
            drop(db);
        })
        .await;

    // Return a fresh connection for the current test's runtime
    let mut cfg = DatabaseConfig::from_file().unwrap_or_else(|_| DatabaseConfig::from_env());
    cfg.max_connections = cfg.max_connections.max(20);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout = std::time::Duration::from_secs(10);
    let db = connect_with_config(&cfg).await?;
    Ok(db)
}

/// Create a user with the given role/area names, for wiring test fixtures.
pub async fn make_user(
    db: &DatabaseConnection,
    role: &str,
    area: &str,
) -> Result<models::user::Model, anyhow::Error> {
    let role_row = models::role::find_by_name(db, role).await?;
    let area_row = models::area::find_by_name(db, area).await?;
    let email = format!("fixture_{}@example.com", uuid::Uuid::new_v4());
    let u = models::user::create(db, role_row.id, area_row.id, &email, "Fixture User").await?;
    Ok(u)
}

/// Create an active client assigned to the given pautador.
pub async fn make_client(
    db: &DatabaseConnection,
    pautador_id: uuid::Uuid,
) -> Result<models::client::Model, anyhow::Error> {
    let name = format!("fixture_client_{}", uuid::Uuid::new_v4());
    let c = models::client::create(db, &name, "billing@example.com", pautador_id, None).await?;
    Ok(c)
}

/// Create a category in the given area; `fixed` None makes it variable-cost.
pub async fn make_category(
    db: &DatabaseConnection,
    area: &str,
    fixed: Option<i64>,
    requires_detail: bool,
) -> Result<models::category::Model, anyhow::Error> {
    let area_row = models::area::find_by_name(db, area).await?;
    let name = format!("fixture_cat_{}", uuid::Uuid::new_v4());
    let cat = models::category::create(db, &name, area_row.id, fixed, requires_detail).await?;
    Ok(cat)
}
