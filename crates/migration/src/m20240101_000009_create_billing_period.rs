//! Create `billing_period` table with FK to `client`.
//!
//! One row per (client, year, month); uniqueness enforced by index migration.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingPeriod::Table)
                    .if_not_exists()
                    .col(uuid(BillingPeriod::Id).primary_key())
                    .col(uuid(BillingPeriod::ClientId).not_null())
                    .col(integer(BillingPeriod::Year).not_null())
                    .col(integer(BillingPeriod::Month).not_null())
                    .col(integer(BillingPeriod::RequestCount).not_null())
                    .col(big_integer(BillingPeriod::TotalCostCents).not_null())
                    .col(string_len(BillingPeriod::Status, 16).not_null())
                    .col(
                        ColumnDef::new(BillingPeriod::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BillingPeriod::InvoicedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(BillingPeriod::ComputedAt).not_null())
                    .col(timestamp_with_time_zone(BillingPeriod::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_client")
                            .from(BillingPeriod::Table, BillingPeriod::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(BillingPeriod::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum BillingPeriod {
    Table,
    Id,
    ClientId,
    Year,
    Month,
    RequestCount,
    TotalCostCents,
    Status,
    ClosedAt,
    InvoicedAt,
    ComputedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Client { Table, Id }
