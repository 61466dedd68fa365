//! Create `notification` table with FK to `user`.
//!
//! Per-user inbox entries; read flag drives the unread counter.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(big_integer(Notification::Id).primary_key().auto_increment())
                    .col(uuid(Notification::UserId).not_null())
                    .col(string_len(Notification::Kind, 32).not_null())
                    .col(text(Notification::Message).not_null())
                    .col(boolean(Notification::Read).not_null())
                    .col(timestamp_with_time_zone(Notification::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_user")
                            .from(Notification::Table, Notification::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Notification::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Notification { Table, Id, UserId, Kind, Message, Read, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
