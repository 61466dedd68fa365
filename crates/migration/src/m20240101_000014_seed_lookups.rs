//! Seed the `role` and `area` lookup tables.
//!
//! Services resolve these rows by name, so the generated ids do not matter.
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ROLES: [&str; 3] = ["admin", "manager", "staff"];
const AREAS: [&str; 3] = ["design", "ad_buying", "administration"];

fn uuid_value(id: Uuid) -> SimpleExpr {
    Expr::val(id.to_string()).cast_as(Alias::new("uuid"))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in ROLES {
            let insert = Query::insert()
                .into_table(Role::Table)
                .columns([Role::Id, Role::Name, Role::CreatedAt])
                .values_panic([
                    uuid_value(Uuid::new_v4()),
                    name.into(),
                    Expr::current_timestamp().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }
        for name in AREAS {
            let insert = Query::insert()
                .into_table(Area::Table)
                .columns([Area::Id, Area::Name, Area::CreatedAt])
                .values_panic([
                    uuid_value(Uuid::new_v4()),
                    name.into(),
                    Expr::current_timestamp().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in ROLES {
            let delete = Query::delete()
                .from_table(Role::Table)
                .and_where(Expr::col(Role::Name).eq(name))
                .to_owned();
            manager.exec_stmt(delete).await?;
        }
        for name in AREAS {
            let delete = Query::delete()
                .from_table(Area::Table)
                .and_where(Expr::col(Area::Name).eq(name))
                .to_owned();
            manager.exec_stmt(delete).await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Role { Table, Id, Name, CreatedAt }

#[derive(DeriveIden)]
enum Area { Table, Id, Name, CreatedAt }
