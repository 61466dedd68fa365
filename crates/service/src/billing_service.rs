//! Monthly billing periods per client, aggregated across both the live
//! request table and the archive. Recomputation is idempotent and only allowed
//! while the period is open; the status walk is one-way:
//! open -> closed -> invoiced.

use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::billing_period::{self, PeriodStatus};
use models::{audit_log, client, request, request_history};

use crate::actor::Actor;
use crate::errors::ServiceError;
use crate::period::month_bounds;

pub async fn find_period(
    db: &DatabaseConnection,
    client_id: Uuid,
    year: i32,
    month: u32,
) -> Result<Option<billing_period::Model>, ServiceError> {
    billing_period::Entity::find()
        .filter(billing_period::Column::ClientId.eq(client_id))
        .filter(billing_period::Column::Year.eq(year))
        .filter(billing_period::Column::Month.eq(month as i32))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Count and cost of the client's requests created in the month, summed
/// across the live table and the archive. An archived request keeps its
/// original creation timestamp, so the two tables never double-count.
async fn aggregate(
    db: &DatabaseConnection,
    client_id: Uuid,
    year: i32,
    month: u32,
) -> Result<(i32, i64), ServiceError> {
    let (start, end) = month_bounds(year, month)?;
    let live = request::Entity::find()
        .filter(request::Column::ClientId.eq(client_id))
        .filter(request::Column::CreatedAt.gte(start))
        .filter(request::Column::CreatedAt.lt(end))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let archived = request_history::Entity::find()
        .filter(request_history::Column::ClientId.eq(client_id))
        .filter(request_history::Column::CreatedAt.gte(start))
        .filter(request_history::Column::CreatedAt.lt(end))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let count = (live.len() + archived.len()) as i32;
    let total: i64 = live.iter().map(|r| r.cost_cents).sum::<i64>()
        + archived.iter().map(|r| r.cost_cents).sum::<i64>();
    Ok((count, total))
}

/// Find-or-create the period row and overwrite its aggregates. Rejected once
/// the period is closed or invoiced.
#[instrument(skip(db))]
pub async fn compute_period(
    db: &DatabaseConnection,
    client_id: Uuid,
    year: i32,
    month: u32,
) -> Result<billing_period::Model, ServiceError> {
    client::Entity::find_by_id(client_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("client"))?;

    let (request_count, total_cost_cents) = aggregate(db, client_id, year, month).await?;
    let now = Utc::now();

    let saved = match find_period(db, client_id, year, month).await? {
        Some(row) => {
            if row.status()? != PeriodStatus::Open {
                return Err(ServiceError::Conflict(format!(
                    "billing period is {}, recomputation is only allowed while open",
                    row.status
                )));
            }
            let mut am: billing_period::ActiveModel = row.into();
            am.request_count = Set(request_count);
            am.total_cost_cents = Set(total_cost_cents);
            am.computed_at = Set(now.into());
            am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?
        }
        None => {
            let am = billing_period::ActiveModel {
                id: Set(Uuid::new_v4()),
                client_id: Set(client_id),
                year: Set(year),
                month: Set(month as i32),
                request_count: Set(request_count),
                total_cost_cents: Set(total_cost_cents),
                status: Set(PeriodStatus::Open.as_str().into()),
                closed_at: Set(None),
                invoiced_at: Set(None),
                computed_at: Set(now.into()),
                created_at: Set(now.into()),
            };
            am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?
        }
    };
    info!(client_id = %client_id, year, month, request_count, total_cost_cents, "billing_period_computed");
    Ok(saved)
}

/// Close an open period. Aggregates are recomputed one last time so the frozen
/// numbers reflect every archival up to this moment.
#[instrument(skip(db))]
pub async fn close_period(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<billing_period::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("close billing periods"));
    }
    let row = billing_period::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("billing period"))?;
    if row.status()? != PeriodStatus::Open {
        return Err(ServiceError::Conflict(format!("period is already {}", row.status)));
    }

    let refreshed = compute_period(db, row.client_id, row.year, row.month as u32).await?;
    let now = Utc::now();
    let mut am: billing_period::ActiveModel = refreshed.into();
    am.status = Set(PeriodStatus::Closed.as_str().into());
    am.closed_at = Set(Some(now.into()));
    let closed = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_log::append(
        db,
        "billing_period",
        &id.to_string(),
        "status",
        Some(PeriodStatus::Open.as_str().into()),
        Some(PeriodStatus::Closed.as_str().into()),
        Some(actor.id),
    )
    .await?;
    info!(period_id = %id, total_cost_cents = closed.total_cost_cents, "billing_period_closed");
    Ok(closed)
}

/// Mark a closed period invoiced. Terminal.
#[instrument(skip(db))]
pub async fn invoice_period(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<billing_period::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("invoice billing periods"));
    }
    let row = billing_period::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("billing period"))?;
    if row.status()? != PeriodStatus::Closed {
        return Err(ServiceError::Conflict(format!(
            "only closed periods can be invoiced (status: {})",
            row.status
        )));
    }

    let now = Utc::now();
    let mut am: billing_period::ActiveModel = row.into();
    am.status = Set(PeriodStatus::Invoiced.as_str().into());
    am.invoiced_at = Set(Some(now.into()));
    let invoiced = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_log::append(
        db,
        "billing_period",
        &id.to_string(),
        "status",
        Some(PeriodStatus::Closed.as_str().into()),
        Some(PeriodStatus::Invoiced.as_str().into()),
        Some(actor.id),
    )
    .await?;
    info!(period_id = %id, "billing_period_invoiced");
    Ok(invoiced)
}

/// Fetch the period, generating it on first access. Existing rows come back
/// untouched whatever their status.
pub async fn get_or_compute(
    db: &DatabaseConnection,
    client_id: Uuid,
    year: i32,
    month: u32,
) -> Result<billing_period::Model, ServiceError> {
    match find_period(db, client_id, year, month).await? {
        Some(row) => Ok(row),
        None => compute_period(db, client_id, year, month).await,
    }
}

pub async fn list_for_client(
    db: &DatabaseConnection,
    client_id: Uuid,
) -> Result<Vec<billing_period::Model>, ServiceError> {
    billing_period::Entity::find()
        .filter(billing_period::Column::ClientId.eq(client_id))
        .order_by_desc(billing_period::Column::Year)
        .order_by_desc(billing_period::Column::Month)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Monthly housekeeping: compute the previous month's period for every active
/// client. Periods stay open for a human to close. Per-client failures are
/// logged and skipped.
#[instrument(skip(db))]
pub async fn generate_previous_month(db: &DatabaseConnection) -> Result<u64, ServiceError> {
    let now = Utc::now();
    let (year, month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };

    let clients = client::Entity::find()
        .filter(client::Column::Active.eq(true))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;

    let mut generated = 0u64;
    for c in clients {
        match compute_period(db, c.id, year, month).await {
            Ok(_) => generated += 1,
            // already-closed periods are fine to skip on a re-run
            Err(ServiceError::Conflict(_)) => {}
            Err(e) => warn!(client_id = %c.id, error = %e, "billing_generation_failed"),
        }
    }
    info!(year, month, generated, "billing_generation_done");
    Ok(generated)
}
