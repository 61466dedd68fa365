use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Request: indexes on client_id, assignee_id and state for list filters
        manager
            .create_index(
                Index::create()
                    .name("idx_request_client")
                    .table(Request::Table)
                    .col(Request::ClientId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_request_assignee")
                    .table(Request::Table)
                    .col(Request::AssigneeId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_request_state")
                    .table(Request::Table)
                    .col(Request::State)
                    .to_owned(),
            )
            .await?;

        // RequestHistory: client + archived_at for billing scans
        manager
            .create_index(
                Index::create()
                    .name("idx_history_client")
                    .table(RequestHistory::Table)
                    .col(RequestHistory::ClientId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_history_resolved_at")
                    .table(RequestHistory::Table)
                    .col(RequestHistory::ResolvedAt)
                    .to_owned(),
            )
            .await?;

        // BillingPeriod: composite unique (client_id, year, month)
        manager
            .create_index(
                Index::create()
                    .name("uniq_billing_client_year_month")
                    .table(BillingPeriod::Table)
                    .col(BillingPeriod::ClientId)
                    .col(BillingPeriod::Year)
                    .col(BillingPeriod::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // UserStatistic: composite unique (user_id, year, month)
        manager
            .create_index(
                Index::create()
                    .name("uniq_statistic_user_year_month")
                    .table(UserStatistic::Table)
                    .col(UserStatistic::UserId)
                    .col(UserStatistic::Year)
                    .col(UserStatistic::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Notification: user + read for unread counts
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user_read")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .col(Notification::Read)
                    .to_owned(),
            )
            .await?;

        // AuditLog: entity lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entity")
                    .table(AuditLog::Table)
                    .col(AuditLog::Entity)
                    .col(AuditLog::EntityId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_request_client").table(Request::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_request_assignee").table(Request::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_request_state").table(Request::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_history_client").table(RequestHistory::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_history_resolved_at").table(RequestHistory::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_billing_client_year_month").table(BillingPeriod::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_statistic_user_year_month").table(UserStatistic::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_notification_user_read").table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_entity").table(AuditLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Request { Table, ClientId, AssigneeId, State }

#[derive(DeriveIden)]
enum RequestHistory { Table, ClientId, ResolvedAt }

#[derive(DeriveIden)]
enum BillingPeriod { Table, ClientId, Year, Month }

#[derive(DeriveIden)]
enum UserStatistic { Table, UserId, Year, Month }

#[derive(DeriveIden)]
enum Notification { Table, UserId, Read }

#[derive(DeriveIden)]
enum AuditLog { Table, Entity, EntityId }
