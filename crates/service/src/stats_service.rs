//! Monthly productivity statistics per user. Computation is idempotent:
//! find-or-create the (user, year, month) row, then overwrite every
//! aggregate. Safe to re-run at any time.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::request::{self, RequestState};
use models::{request_history, user, user_statistic};

use crate::errors::ServiceError;
use crate::period::month_bounds;

/// Recompute one user's statistics for the given month.
///
/// Created counts look at both the live table and history (archived requests
/// were still created that month). Resolution metrics come from history only,
/// attributed to the assignee.
#[instrument(skip(db))]
pub async fn compute_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
    year: i32,
    month: u32,
) -> Result<user_statistic::Model, ServiceError> {
    let (start, end) = month_bounds(year, month)?;

    let created_live = request::Entity::find()
        .filter(request::Column::CreatedBy.eq(user_id))
        .filter(request::Column::CreatedAt.gte(start))
        .filter(request::Column::CreatedAt.lt(end))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let created_hist = request_history::Entity::find()
        .filter(request_history::Column::CreatedBy.eq(user_id))
        .filter(request_history::Column::CreatedAt.gte(start))
        .filter(request_history::Column::CreatedAt.lt(end))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let created_count = (created_live + created_hist) as i32;

    let resolved_rows = request_history::Entity::find()
        .filter(request_history::Column::AssigneeId.eq(user_id))
        .filter(request_history::Column::FinalState.eq(RequestState::Resolved.as_str()))
        .filter(request_history::Column::ResolvedAt.gte(start))
        .filter(request_history::Column::ResolvedAt.lt(end))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let cancelled_count = request_history::Entity::find()
        .filter(request_history::Column::AssigneeId.eq(user_id))
        .filter(request_history::Column::FinalState.eq(RequestState::Cancelled.as_str()))
        .filter(request_history::Column::ResolvedAt.gte(start))
        .filter(request_history::Column::ResolvedAt.lt(end))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))? as i32;

    let resolved_count = resolved_rows.len() as i32;
    let total_secs: i64 = resolved_rows.iter().map(|r| r.total_secs).sum();
    let total_cost_cents: i64 = resolved_rows.iter().map(|r| r.cost_cents).sum();
    let avg_resolution_secs =
        if resolved_count > 0 { total_secs / resolved_count as i64 } else { 0 };

    let now = Utc::now();
    let existing = user_statistic::Entity::find()
        .filter(user_statistic::Column::UserId.eq(user_id))
        .filter(user_statistic::Column::Year.eq(year))
        .filter(user_statistic::Column::Month.eq(month as i32))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;

    let saved = match existing {
        Some(row) => {
            let mut am: user_statistic::ActiveModel = row.into();
            am.created_count = Set(created_count);
            am.resolved_count = Set(resolved_count);
            am.cancelled_count = Set(cancelled_count);
            am.avg_resolution_secs = Set(avg_resolution_secs);
            am.total_cost_cents = Set(total_cost_cents);
            am.computed_at = Set(now.into());
            am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?
        }
        None => {
            let am = user_statistic::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                year: Set(year),
                month: Set(month as i32),
                created_count: Set(created_count),
                resolved_count: Set(resolved_count),
                cancelled_count: Set(cancelled_count),
                avg_resolution_secs: Set(avg_resolution_secs),
                total_cost_cents: Set(total_cost_cents),
                computed_at: Set(now.into()),
            };
            am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?
        }
    };
    Ok(saved)
}

/// Recompute the month for every non-deleted user. Per-user failures are
/// logged and skipped so one bad row cannot sink the sweep.
#[instrument(skip(db))]
pub async fn sweep_all(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
) -> Result<u64, ServiceError> {
    let users = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;

    let mut computed = 0u64;
    for u in users {
        match compute_for_user(db, u.id, year, month).await {
            Ok(_) => computed += 1,
            Err(e) => warn!(user_id = %u.id, error = %e, "stats_compute_failed"),
        }
    }
    info!(year, month, computed, "stats_sweep_done");
    Ok(computed)
}

/// Fetch the stored row, computing it on first access.
pub async fn get_or_compute(
    db: &DatabaseConnection,
    user_id: Uuid,
    year: i32,
    month: u32,
) -> Result<user_statistic::Model, ServiceError> {
    let existing = user_statistic::Entity::find()
        .filter(user_statistic::Column::UserId.eq(user_id))
        .filter(user_statistic::Column::Year.eq(year))
        .filter(user_statistic::Column::Month.eq(month as i32))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    match existing {
        Some(row) => Ok(row),
        None => compute_for_user(db, user_id, year, month).await,
    }
}
