//! Create `client_report` table with FK to `client` and optional link to `request`.
//!
//! The request link uses SetNull so archiving the request keeps the report.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClientReport::Table)
                    .if_not_exists()
                    .col(uuid(ClientReport::Id).primary_key())
                    .col(uuid(ClientReport::ClientId).not_null())
                    .col(string_len(ClientReport::ReportType, 32).not_null())
                    .col(string_len(ClientReport::Priority, 16).not_null())
                    .col(string_len(ClientReport::Status, 16).not_null())
                    .col(text(ClientReport::Description).not_null())
                    .col(
                        ColumnDef::new(ClientReport::RequestId)
                            .uuid()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(ClientReport::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ClientReport::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_client")
                            .from(ClientReport::Table, ClientReport::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_request")
                            .from(ClientReport::Table, ClientReport::RequestId)
                            .to(Request::Table, Request::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ClientReport::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ClientReport {
    Table,
    Id,
    ClientId,
    ReportType,
    Priority,
    Status,
    Description,
    RequestId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client { Table, Id }

#[derive(DeriveIden)]
enum Request { Table, Id }
