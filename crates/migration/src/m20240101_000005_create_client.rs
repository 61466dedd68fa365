//! Create `client` table with FKs to the assigned ad-buyer and optional designer.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(uuid(Client::Id).primary_key())
                    .col(string_len(Client::Name, 128).unique_key().not_null())
                    .col(string_len(Client::ContactEmail, 255).not_null())
                    .col(uuid(Client::PautadorId).not_null())
                    .col(
                        ColumnDef::new(Client::DisenadorId)
                            .uuid()
                            .null(),
                    )
                    .col(boolean(Client::Active).not_null())
                    .col(timestamp_with_time_zone(Client::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Client::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_pautador")
                            .from(Client::Table, Client::PautadorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_disenador")
                            .from(Client::Table, Client::DisenadorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Client::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Client { Table, Id, Name, ContactEmail, PautadorId, DisenadorId, Active, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
