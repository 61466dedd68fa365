//! Create `area` table.
//!
//! Lookup table for agency departments (design, ad-buying, administration).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Area::Table)
                    .if_not_exists()
                    .col(uuid(Area::Id).primary_key())
                    .col(string_len(Area::Name, 64).unique_key().not_null())
                    .col(timestamp_with_time_zone(Area::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Area::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Area { Table, Id, Name, CreatedAt }
