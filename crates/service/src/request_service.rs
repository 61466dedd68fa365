//! Request ("peticion") lifecycle: creation, assignment, timer control and
//! archival of terminal requests into the history table.
//!
//! State machine: Pending -> InProgress -> {Resolved, Cancelled}, with Paused
//! reachable only from InProgress. Resolved/Cancelled rows are copied to
//! `request_history` and deleted from the live table.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::request::{self, RequestState};
use models::{area, audit_log, category, client, notification, request_history};

use crate::actor::Actor;
use crate::errors::ServiceError;
use crate::notification_service;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequestInput {
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub detail: Option<String>,
    /// Required when the category is variable-cost; ignored otherwise.
    #[serde(default)]
    pub cost_cents: Option<i64>,
}

/// A live request plus its lazily computed elapsed time.
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: request::Model,
    pub elapsed_secs: i64,
}

impl From<request::Model> for RequestView {
    fn from(m: request::Model) -> Self {
        let elapsed_secs = m.elapsed_secs();
        Self { request: m, elapsed_secs }
    }
}

/// Result of a mutation: the updated row plus the inbox entries it produced,
/// so the handler layer can push them over the WebSocket channel.
#[derive(Debug)]
pub struct RequestOutcome {
    pub request: request::Model,
    pub notifications: Vec<notification::Model>,
}

/// Result of archival: the history row plus inbox entries.
#[derive(Debug)]
pub struct ArchiveOutcome {
    pub history: request_history::Model,
    pub notifications: Vec<notification::Model>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub state: Option<String>,
    pub client_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

async fn find_live(db: &DatabaseConnection, id: Uuid) -> Result<request::Model, ServiceError> {
    request::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("request"))
}

async fn audit_state(
    db: &DatabaseConnection,
    request_id: Uuid,
    old: Option<&str>,
    new: &str,
    actor: &Actor,
) -> Result<(), ServiceError> {
    audit_log::append(
        db,
        "request",
        &request_id.to_string(),
        "state",
        old.map(|s| s.to_string()),
        Some(new.to_string()),
        Some(actor.id),
    )
    .await?;
    Ok(())
}

/// Create a request. Ad-buying categories auto-assign the client's pautador
/// and start InProgress with a running timer; everything else starts Pending.
#[instrument(skip(db, input), fields(client_id = %input.client_id, category_id = %input.category_id))]
pub async fn create_request(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreateRequestInput,
) -> Result<RequestOutcome, ServiceError> {
    if input.title.trim().is_empty() {
        return Err(ServiceError::Validation("title required".into()));
    }
    if input.description.trim().is_empty() {
        return Err(ServiceError::Validation("description required".into()));
    }

    let client_row = client::Entity::find_by_id(input.client_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("client"))?;
    if !client_row.active {
        return Err(ServiceError::Validation("client is inactive".into()));
    }

    let category_row = category::Entity::find_by_id(input.category_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("category"))?;

    // Cost invariant: fixed categories copy the catalog price, variable ones
    // demand an explicit cost.
    let cost_cents = match category_row.fixed_cost_cents {
        Some(fixed) => fixed,
        None => {
            let cost = input
                .cost_cents
                .ok_or_else(|| ServiceError::Validation("variable-cost category requires an explicit cost".into()))?;
            if cost < 0 {
                return Err(ServiceError::Validation("cost must be >= 0".into()));
            }
            cost
        }
    };

    if category_row.requires_detail
        && input.detail.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(ServiceError::Validation("category requires an extra detail description".into()));
    }

    let area_row = area::Entity::find_by_id(category_row.area_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("area"))?;
    let auto_assign = area_row.name == area::AD_BUYING;

    let now: DateTime<Utc> = Utc::now();
    let (state, assignee_id, accepted_at, timer_active, timer_started_at) = if auto_assign {
        (
            RequestState::InProgress,
            Some(client_row.pautador_id),
            Some(now.into()),
            true,
            Some(now.into()),
        )
    } else {
        (RequestState::Pending, None, None, false, None)
    };

    let am = request::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client_row.id),
        category_id: Set(category_row.id),
        created_by: Set(actor.id),
        assignee_id: Set(assignee_id),
        state: Set(state.as_str().into()),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        detail: Set(input.detail),
        cost_cents: Set(cost_cents),
        accepted_at: Set(accepted_at),
        accumulated_secs: Set(0),
        timer_active: Set(timer_active),
        timer_started_at: Set(timer_started_at),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let created = am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_state(db, created.id, None, state.as_str(), actor).await?;

    let mut notifications = Vec::new();
    if let Some(assignee) = created.assignee_id {
        let n = notification_service::notify(
            db,
            assignee,
            notification::KIND_REQUEST_CREATED,
            &format!("request '{}' assigned to you for client {}", created.title, client_row.name),
        )
        .await?;
        notifications.push(n);
    } else if area_row.name == area::DESIGN {
        if let Some(disenador) = client_row.disenador_id {
            let n = notification_service::notify(
                db,
                disenador,
                notification::KIND_REQUEST_CREATED,
                &format!("new design request '{}' for client {}", created.title, client_row.name),
            )
            .await?;
            notifications.push(n);
        }
    }

    info!(request_id = %created.id, state = %created.state, "request_created");
    Ok(RequestOutcome { request: created, notifications })
}

pub async fn get_request(db: &DatabaseConnection, id: Uuid) -> Result<RequestView, ServiceError> {
    Ok(find_live(db, id).await?.into())
}

pub async fn list_requests(
    db: &DatabaseConnection,
    filter: RequestFilter,
    opts: Pagination,
) -> Result<Vec<RequestView>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = request::Entity::find();
    if let Some(state) = &filter.state {
        RequestState::parse(state)?;
        query = query.filter(request::Column::State.eq(state.clone()));
    }
    if let Some(client_id) = filter.client_id {
        query = query.filter(request::Column::ClientId.eq(client_id));
    }
    if let Some(assignee_id) = filter.assignee_id {
        query = query.filter(request::Column::AssigneeId.eq(assignee_id));
    }
    let rows = query
        .order_by_desc(request::Column::CreatedAt)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Accept a pending request: assign the acting user and start the timer.
#[instrument(skip(db))]
pub async fn accept_request(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<RequestOutcome, ServiceError> {
    let found = find_live(db, id).await?;
    let state = found.state()?;
    if state != RequestState::Pending {
        return Err(ServiceError::Conflict(format!(
            "only pending requests can be accepted (state: {})",
            found.state
        )));
    }

    let now = Utc::now();
    let creator = found.created_by;
    let title = found.title.clone();
    let mut am: request::ActiveModel = found.into();
    am.assignee_id = Set(Some(actor.id));
    am.state = Set(RequestState::InProgress.as_str().into());
    am.accepted_at = Set(Some(now.into()));
    am.accumulated_secs = Set(0);
    am.timer_active = Set(true);
    am.timer_started_at = Set(Some(now.into()));
    am.updated_at = Set(now.into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_state(db, id, Some(RequestState::Pending.as_str()), updated.state.as_str(), actor).await?;

    let mut notifications = Vec::new();
    if creator != actor.id {
        let n = notification_service::notify(
            db,
            creator,
            notification::KIND_REQUEST_STATE,
            &format!("request '{}' was accepted by {}", title, actor.email),
        )
        .await?;
        notifications.push(n);
    }

    info!(request_id = %id, assignee = %actor.id, "request_accepted");
    Ok(RequestOutcome { request: updated, notifications })
}

/// Pause the running timer. Only the assignee may pause, and only while the
/// timer is actually running; a second pause without a resume is rejected.
#[instrument(skip(db))]
pub async fn pause_request(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<RequestOutcome, ServiceError> {
    let found = find_live(db, id).await?;
    if found.assignee_id != Some(actor.id) {
        return Err(ServiceError::forbidden("pause a request assigned to someone else"));
    }
    let state = found.state()?;
    if state != RequestState::InProgress || !found.timer_active {
        return Err(ServiceError::Conflict("timer is not running".into()));
    }

    let now = Utc::now();
    let ran = found
        .timer_started_at
        .map(|s| (now - s.with_timezone(&Utc)).num_seconds().max(0))
        .unwrap_or(0);
    let accumulated = found.accumulated_secs + ran;

    let mut am: request::ActiveModel = found.into();
    am.state = Set(RequestState::Paused.as_str().into());
    am.accumulated_secs = Set(accumulated);
    am.timer_active = Set(false);
    am.timer_started_at = Set(None);
    am.updated_at = Set(now.into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_state(db, id, Some(RequestState::InProgress.as_str()), updated.state.as_str(), actor).await?;
    info!(request_id = %id, accumulated_secs = accumulated, "request_paused");
    Ok(RequestOutcome { request: updated, notifications: Vec::new() })
}

/// Resume a paused timer. Only the assignee; resets the start timestamp.
#[instrument(skip(db))]
pub async fn resume_request(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<RequestOutcome, ServiceError> {
    let found = find_live(db, id).await?;
    if found.assignee_id != Some(actor.id) {
        return Err(ServiceError::forbidden("resume a request assigned to someone else"));
    }
    if found.state()? != RequestState::Paused {
        return Err(ServiceError::Conflict("request is not paused".into()));
    }

    let now = Utc::now();
    let mut am: request::ActiveModel = found.into();
    am.state = Set(RequestState::InProgress.as_str().into());
    am.timer_active = Set(true);
    am.timer_started_at = Set(Some(now.into()));
    am.updated_at = Set(now.into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_state(db, id, Some(RequestState::Paused.as_str()), updated.state.as_str(), actor).await?;
    info!(request_id = %id, "request_resumed");
    Ok(RequestOutcome { request: updated, notifications: Vec::new() })
}

/// Resolve a request (assignee only) and archive it.
#[instrument(skip(db))]
pub async fn resolve_request(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<ArchiveOutcome, ServiceError> {
    let found = find_live(db, id).await?;
    if found.assignee_id != Some(actor.id) {
        return Err(ServiceError::forbidden("resolve a request assigned to someone else"));
    }
    let state = found.state()?;
    if !matches!(state, RequestState::InProgress | RequestState::Paused) {
        return Err(ServiceError::Conflict(format!(
            "request cannot be resolved from state {}",
            found.state
        )));
    }
    archive(db, actor, found, RequestState::Resolved).await
}

/// Cancel a request (assignee or a manager) and archive it.
#[instrument(skip(db))]
pub async fn cancel_request(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<ArchiveOutcome, ServiceError> {
    let found = find_live(db, id).await?;
    let is_assignee = found.assignee_id == Some(actor.id);
    if !is_assignee && !actor.is_manager() {
        return Err(ServiceError::forbidden("cancel this request"));
    }
    if found.state()?.is_terminal() {
        return Err(ServiceError::Conflict("request is already terminal".into()));
    }
    archive(db, actor, found, RequestState::Cancelled).await
}

/// Copy the live row into history, then delete it. Create-then-delete without
/// a wrapping transaction, matching the accepted consistency model.
async fn archive(
    db: &DatabaseConnection,
    actor: &Actor,
    found: request::Model,
    final_state: RequestState,
) -> Result<ArchiveOutcome, ServiceError> {
    let now = Utc::now();
    let total_secs = found.elapsed_secs_at(now);
    let old_state = found.state.clone();

    let hist = request_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        origin_request_id: Set(found.id),
        client_id: Set(found.client_id),
        category_id: Set(found.category_id),
        created_by: Set(found.created_by),
        assignee_id: Set(found.assignee_id),
        final_state: Set(final_state.as_str().into()),
        title: Set(found.title.clone()),
        description: Set(found.description.clone()),
        cost_cents: Set(found.cost_cents),
        accepted_at: Set(found.accepted_at),
        resolved_at: Set(now.into()),
        total_secs: Set(total_secs),
        created_at: Set(found.created_at),
        archived_at: Set(now.into()),
    };
    let history = hist.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    request::Entity::delete_by_id(found.id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;

    audit_state(db, found.id, Some(&old_state), final_state.as_str(), actor).await?;

    let mut notifications = Vec::new();
    for target in [Some(found.created_by), found.assignee_id].into_iter().flatten() {
        if target == actor.id {
            continue;
        }
        let verb = if final_state == RequestState::Resolved { "resolved" } else { "cancelled" };
        let n = notification_service::notify(
            db,
            target,
            notification::KIND_REQUEST_STATE,
            &format!("request '{}' was {}", found.title, verb),
        )
        .await?;
        notifications.push(n);
    }

    info!(
        request_id = %found.id,
        history_id = %history.id,
        final_state = %history.final_state,
        total_secs,
        "request_archived"
    );
    Ok(ArchiveOutcome { history, notifications })
}

pub async fn list_history(
    db: &DatabaseConnection,
    client_id: Option<Uuid>,
    opts: Pagination,
) -> Result<Vec<request_history::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = request_history::Entity::find();
    if let Some(client_id) = client_id {
        query = query.filter(request_history::Column::ClientId.eq(client_id));
    }
    let rows = query
        .order_by_desc(request_history::Column::ArchivedAt)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_category, make_client, make_user};
    use models::{area, role};

    fn actor_for(u: &models::user::Model, role: &str, area: &str) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role.into(), area: area.into() }
    }

    #[tokio::test]
    async fn ad_buying_creation_auto_assigns_and_starts_timer() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let creator = make_user(&db, role::STAFF, area::ADMINISTRATION).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let cat = make_category(&db, area::AD_BUYING, Some(5_000), false).await?;

        let actor = actor_for(&creator, role::STAFF, area::ADMINISTRATION);
        let out = create_request(
            &db,
            &actor,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Campaign slot".into(),
                description: "Buy prime-time slot".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await?;

        assert_eq!(out.request.state, "in_progress");
        assert_eq!(out.request.assignee_id, Some(pautador.id));
        assert!(out.request.timer_active);
        assert!(out.request.accepted_at.is_some());
        assert_eq!(out.request.cost_cents, 5_000);
        // the auto-assigned pautador got an inbox entry
        assert_eq!(out.notifications.len(), 1);
        assert_eq!(out.notifications[0].user_id, pautador.id);

        request::Entity::delete_by_id(out.request.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn variable_category_requires_explicit_cost() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let cat = make_category(&db, area::DESIGN, None, false).await?;
        let actor = actor_for(&pautador, role::STAFF, area::AD_BUYING);

        let err = create_request(
            &db,
            &actor,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Banner".into(),
                description: "New banner".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // with an explicit cost it goes through, starting Pending
        let out = create_request(
            &db,
            &actor,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Banner".into(),
                description: "New banner".into(),
                detail: None,
                cost_cents: Some(12_000),
            },
        )
        .await?;
        assert_eq!(out.request.state, "pending");
        assert_eq!(out.request.cost_cents, 12_000);
        assert!(out.request.assignee_id.is_none());

        request::Entity::delete_by_id(out.request.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn double_pause_is_rejected() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let worker = make_user(&db, role::STAFF, area::DESIGN).await?;
        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let cat = make_category(&db, area::DESIGN, Some(1_000), false).await?;
        let actor = actor_for(&worker, role::STAFF, area::DESIGN);

        let out = create_request(
            &db,
            &actor,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Logo".into(),
                description: "Refresh logo".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await?;
        let id = out.request.id;

        let accepted = accept_request(&db, &actor, id).await?;
        assert!(accepted.request.timer_active);

        pause_request(&db, &actor, id).await?;
        let err = pause_request(&db, &actor, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // resume, then pausing is allowed again
        resume_request(&db, &actor, id).await?;
        pause_request(&db, &actor, id).await?;

        request::Entity::delete_by_id(id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn resolve_archives_exactly_one_history_row() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let worker = make_user(&db, role::STAFF, area::DESIGN).await?;
        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let cat = make_category(&db, area::DESIGN, Some(2_500), false).await?;
        let actor = actor_for(&worker, role::STAFF, area::DESIGN);

        let out = create_request(
            &db,
            &actor,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Flyer".into(),
                description: "Summer flyer".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await?;
        let id = out.request.id;
        accept_request(&db, &actor, id).await?;

        let archived = resolve_request(&db, &actor, id).await?;
        assert_eq!(archived.history.origin_request_id, id);
        assert_eq!(archived.history.final_state, "resolved");

        // live row is gone
        let live = request::Entity::find_by_id(id).one(&db).await?;
        assert!(live.is_none());

        // exactly one history row with this lineage
        let count = request_history::Entity::find()
            .filter(request_history::Column::OriginRequestId.eq(id))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        // a second resolve is a not-found
        let err = resolve_request(&db, &actor, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        request_history::Entity::delete_by_id(archived.history.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn requires_detail_category_rejects_missing_detail() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let cat = make_category(&db, area::DESIGN, Some(1_000), true).await?;
        let actor = actor_for(&pautador, role::STAFF, area::AD_BUYING);

        let err = create_request(
            &db,
            &actor,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Poster".into(),
                description: "Event poster".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        Ok(())
    }
}
