//! Create `audit_log` table, append-only record of field-level changes.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(big_integer(AuditLog::Id).primary_key().auto_increment())
                    .col(string_len(AuditLog::Entity, 64).not_null())
                    .col(string_len(AuditLog::EntityId, 64).not_null())
                    .col(string_len(AuditLog::Field, 64).not_null())
                    .col(
                        ColumnDef::new(AuditLog::OldValue)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AuditLog::NewValue)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AuditLog::UserId)
                            .uuid()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(AuditLog::Timestamp).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLog { Table, Id, Entity, EntityId, Field, OldValue, NewValue, UserId, Timestamp }
