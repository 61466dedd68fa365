//! Create `user_statistic` table with FK to `user`.
//!
//! One row per (user, year, month); recomputed in place, uniqueness via index.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserStatistic::Table)
                    .if_not_exists()
                    .col(uuid(UserStatistic::Id).primary_key())
                    .col(uuid(UserStatistic::UserId).not_null())
                    .col(integer(UserStatistic::Year).not_null())
                    .col(integer(UserStatistic::Month).not_null())
                    .col(integer(UserStatistic::CreatedCount).not_null())
                    .col(integer(UserStatistic::ResolvedCount).not_null())
                    .col(integer(UserStatistic::CancelledCount).not_null())
                    .col(big_integer(UserStatistic::AvgResolutionSecs).not_null())
                    .col(big_integer(UserStatistic::TotalCostCents).not_null())
                    .col(timestamp_with_time_zone(UserStatistic::ComputedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statistic_user")
                            .from(UserStatistic::Table, UserStatistic::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserStatistic::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserStatistic {
    Table,
    Id,
    UserId,
    Year,
    Month,
    CreatedCount,
    ResolvedCount,
    CancelledCount,
    AvgResolutionSecs,
    TotalCostCents,
    ComputedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
