//! Per-user inbox. Rows are created by the other services as side effects of
//! domain events; the purge job trims old read entries.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::notification;

use crate::actor::Actor;
use crate::errors::ServiceError;

/// Persist an inbox entry for one user.
pub async fn notify(
    db: &DatabaseConnection,
    user_id: Uuid,
    kind: &str,
    message: &str,
) -> Result<notification::Model, ServiceError> {
    Ok(notification::create(db, user_id, kind, message).await?)
}

pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
    unread_only: bool,
    opts: Pagination,
) -> Result<Vec<notification::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id));
    if unread_only {
        query = query.filter(notification::Column::Read.eq(false));
    }
    let rows = query
        .order_by_desc(notification::Column::CreatedAt)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows)
}

pub async fn unread_count(db: &DatabaseConnection, user_id: Uuid) -> Result<u64, ServiceError> {
    notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Read.eq(false))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Mark one entry read. Only the owner may touch it.
pub async fn mark_read(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i64,
) -> Result<notification::Model, ServiceError> {
    let found = notification::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("notification"))?;
    if found.user_id != actor.id {
        return Err(ServiceError::forbidden("read someone else's notification"));
    }
    let mut am: notification::ActiveModel = found.into();
    am.read = Set(true);
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn mark_all_read(db: &DatabaseConnection, user_id: Uuid) -> Result<u64, ServiceError> {
    let res = notification::Entity::update_many()
        .col_expr(notification::Column::Read, sea_orm::sea_query::Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Read.eq(false))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}

/// Delete read entries older than the retention window. Unread entries are
/// kept regardless of age.
#[instrument(skip(db))]
pub async fn purge_older_than(
    db: &DatabaseConnection,
    retention_days: i64,
) -> Result<u64, ServiceError> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    let res = notification::Entity::delete_many()
        .filter(notification::Column::Read.eq(true))
        .filter(notification::Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if res.rows_affected > 0 {
        info!(purged = res.rows_affected, retention_days, "notifications_purged");
    }
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_user};
    use models::{area, role};

    #[tokio::test]
    async fn mark_read_is_owner_only() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let owner = make_user(&db, role::STAFF, area::DESIGN).await?;
        let other = make_user(&db, role::STAFF, area::DESIGN).await?;
        let n = notify(&db, owner.id, notification::KIND_REQUEST_STATE, "hello").await?;

        let intruder = Actor {
            id: other.id,
            email: other.email.clone(),
            role: role::STAFF.into(),
            area: area::DESIGN.into(),
        };
        let err = mark_read(&db, &intruder, n.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let me = Actor {
            id: owner.id,
            email: owner.email.clone(),
            role: role::STAFF.into(),
            area: area::DESIGN.into(),
        };
        let read = mark_read(&db, &me, n.id).await?;
        assert!(read.read);

        notification::Entity::delete_by_id(n.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn purge_removes_only_old_read_entries() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let owner = make_user(&db, role::STAFF, area::DESIGN).await?;
        let old_ts = Utc::now() - Duration::days(90);

        // aged read entry: eligible
        let aged = notification::ActiveModel {
            user_id: Set(owner.id),
            kind: Set(notification::KIND_REQUEST_STATE.into()),
            message: Set("old read".into()),
            read: Set(true),
            created_at: Set(old_ts.into()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // aged unread entry: kept
        let aged_unread = notification::ActiveModel {
            user_id: Set(owner.id),
            kind: Set(notification::KIND_REQUEST_STATE.into()),
            message: Set("old unread".into()),
            read: Set(false),
            created_at: Set(old_ts.into()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let purged = purge_older_than(&db, 30).await?;
        assert!(purged >= 1);

        assert!(notification::Entity::find_by_id(aged.id).one(&db).await?.is_none());
        assert!(notification::Entity::find_by_id(aged_unread.id).one(&db).await?.is_some());

        notification::Entity::delete_by_id(aged_unread.id).exec(&db).await?;
        Ok(())
    }
}
