//! Migrator registering entity-specific migrations in dependency order.
//! Lookup seeds and indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_role;
mod m20240101_000002_create_area;
mod m20240101_000003_create_user;
mod m20240101_000004_create_user_credentials;
mod m20240101_000005_create_client;
mod m20240101_000006_create_category;
mod m20240101_000007_create_request;
mod m20240101_000008_create_request_history;
mod m20240101_000009_create_billing_period;
mod m20240101_000010_create_user_statistic;
mod m20240101_000011_create_notification;
mod m20240101_000012_create_client_report;
mod m20240101_000013_create_audit_log;
mod m20240101_000014_seed_lookups;
mod m20240101_000015_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_role::Migration),
            Box::new(m20240101_000002_create_area::Migration),
            Box::new(m20240101_000003_create_user::Migration),
            Box::new(m20240101_000004_create_user_credentials::Migration),
            Box::new(m20240101_000005_create_client::Migration),
            Box::new(m20240101_000006_create_category::Migration),
            Box::new(m20240101_000007_create_request::Migration),
            Box::new(m20240101_000008_create_request_history::Migration),
            Box::new(m20240101_000009_create_billing_period::Migration),
            Box::new(m20240101_000010_create_user_statistic::Migration),
            Box::new(m20240101_000011_create_notification::Migration),
            Box::new(m20240101_000012_create_client_report::Migration),
            Box::new(m20240101_000013_create_audit_log::Migration),
            Box::new(m20240101_000014_seed_lookups::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000015_add_indexes::Migration),
        ]
    }
}
