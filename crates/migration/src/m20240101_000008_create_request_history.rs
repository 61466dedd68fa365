//! Create `request_history` table, the append-only archive of terminal requests.
//!
//! `origin_request_id` carries the lineage to the deleted live row; no FK since
//! that row no longer exists.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RequestHistory::Table)
                    .if_not_exists()
                    .col(uuid(RequestHistory::Id).primary_key())
                    .col(uuid(RequestHistory::OriginRequestId).unique_key().not_null())
                    .col(uuid(RequestHistory::ClientId).not_null())
                    .col(uuid(RequestHistory::CategoryId).not_null())
                    .col(uuid(RequestHistory::CreatedBy).not_null())
                    .col(
                        ColumnDef::new(RequestHistory::AssigneeId)
                            .uuid()
                            .null(),
                    )
                    .col(string_len(RequestHistory::FinalState, 16).not_null())
                    .col(string_len(RequestHistory::Title, 200).not_null())
                    .col(text(RequestHistory::Description).not_null())
                    .col(big_integer(RequestHistory::CostCents).not_null())
                    .col(
                        ColumnDef::new(RequestHistory::AcceptedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(RequestHistory::ResolvedAt).not_null())
                    .col(big_integer(RequestHistory::TotalSecs).not_null())
                    .col(timestamp_with_time_zone(RequestHistory::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(RequestHistory::ArchivedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RequestHistory::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum RequestHistory {
    Table,
    Id,
    OriginRequestId,
    ClientId,
    CategoryId,
    CreatedBy,
    AssigneeId,
    FinalState,
    Title,
    Description,
    CostCents,
    AcceptedAt,
    ResolvedAt,
    TotalSecs,
    CreatedAt,
    ArchivedAt,
}
