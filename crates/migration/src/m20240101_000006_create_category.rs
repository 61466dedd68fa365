//! Create `category` table (service catalog) with FK to `area`.
//!
//! A NULL `fixed_cost_cents` marks a variable-cost category; requests in it
//! must supply their own cost.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(uuid(Category::Id).primary_key())
                    .col(string_len(Category::Name, 128).unique_key().not_null())
                    .col(uuid(Category::AreaId).not_null())
                    .col(
                        ColumnDef::new(Category::FixedCostCents)
                            .big_integer()
                            .null(),
                    )
                    .col(boolean(Category::RequiresDetail).not_null())
                    .col(timestamp_with_time_zone(Category::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Category::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_area")
                            .from(Category::Table, Category::AreaId)
                            .to(Area::Table, Area::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Category::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Category { Table, Id, Name, AreaId, FixedCostCents, RequiresDetail, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Area { Table, Id }
