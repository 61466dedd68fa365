//! Create `request` table, the live workflow entity.
//!
//! Holds only non-terminal requests; terminal rows move to `request_history`.
//! Timer fields: accumulated seconds plus an active start timestamp.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Request::Table)
                    .if_not_exists()
                    .col(uuid(Request::Id).primary_key())
                    .col(uuid(Request::ClientId).not_null())
                    .col(uuid(Request::CategoryId).not_null())
                    .col(uuid(Request::CreatedBy).not_null())
                    .col(
                        ColumnDef::new(Request::AssigneeId)
                            .uuid()
                            .null(),
                    )
                    .col(string_len(Request::State, 16).not_null())
                    .col(string_len(Request::Title, 200).not_null())
                    .col(text(Request::Description).not_null())
                    .col(
                        ColumnDef::new(Request::Detail)
                            .text()
                            .null(),
                    )
                    .col(big_integer(Request::CostCents).not_null())
                    .col(
                        ColumnDef::new(Request::AcceptedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(big_integer(Request::AccumulatedSecs).not_null())
                    .col(boolean(Request::TimerActive).not_null())
                    .col(
                        ColumnDef::new(Request::TimerStartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(Request::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Request::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_client")
                            .from(Request::Table, Request::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_category")
                            .from(Request::Table, Request::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_creator")
                            .from(Request::Table, Request::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_assignee")
                            .from(Request::Table, Request::AssigneeId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Request::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Request {
    Table,
    Id,
    ClientId,
    CategoryId,
    CreatedBy,
    AssigneeId,
    State,
    Title,
    Description,
    Detail,
    CostCents,
    AcceptedAt,
    AccumulatedSecs,
    TimerActive,
    TimerStartedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client { Table, Id }

#[derive(DeriveIden)]
enum Category { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
