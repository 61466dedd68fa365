//! Client-filed reports (complaints, incidents, change requests). A report can
//! be triaged and, when actionable, converted into a real request; conversion
//! links the new request back to the report.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::client_report::{self, ReportPriority, ReportStatus};
use models::{client, notification};

use crate::actor::Actor;
use crate::errors::ServiceError;
use crate::notification_service;
use crate::request_service::{self, CreateRequestInput, RequestOutcome};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportInput {
    pub client_id: Uuid,
    pub report_type: String,
    pub priority: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<String>,
}

#[instrument(skip(db, input), fields(client_id = %input.client_id))]
pub async fn create_report(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreateReportInput,
) -> Result<client_report::Model, ServiceError> {
    let priority = ReportPriority::parse(&input.priority)?;
    if input.report_type.trim().is_empty() {
        return Err(ServiceError::Validation("report type required".into()));
    }
    if input.description.trim().is_empty() {
        return Err(ServiceError::Validation("description required".into()));
    }
    let client_row = client::Entity::find_by_id(input.client_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("client"))?;

    let now = Utc::now();
    let am = client_report::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client_row.id),
        report_type: Set(input.report_type.trim().to_string()),
        priority: Set(priority.as_str().into()),
        status: Set(ReportStatus::Open.as_str().into()),
        description: Set(input.description),
        request_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let created = am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    // High-signal reports ping the account's pautador immediately.
    if matches!(priority, ReportPriority::High | ReportPriority::Urgent) {
        notification_service::notify(
            db,
            client_row.pautador_id,
            notification::KIND_REPORT,
            &format!("{} priority report filed for client {}", priority.as_str(), client_row.name),
        )
        .await?;
    }

    info!(report_id = %created.id, priority = %created.priority, "report_created");
    Ok(created)
}

pub async fn get_report(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<client_report::Model, ServiceError> {
    client_report::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("report"))
}

pub async fn list_reports(
    db: &DatabaseConnection,
    filter: ReportFilter,
    opts: Pagination,
) -> Result<Vec<client_report::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = client_report::Entity::find();
    if let Some(client_id) = filter.client_id {
        query = query.filter(client_report::Column::ClientId.eq(client_id));
    }
    if let Some(status) = &filter.status {
        ReportStatus::parse(status)?;
        query = query.filter(client_report::Column::Status.eq(status.clone()));
    }
    query
        .order_by_desc(client_report::Column::CreatedAt)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Move a report to `reviewing` or `dismissed`. `converted` is reserved for
/// [`convert_to_request`].
#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
    status: &str,
) -> Result<client_report::Model, ServiceError> {
    let target = ReportStatus::parse(status)?;
    if !matches!(target, ReportStatus::Reviewing | ReportStatus::Dismissed) {
        return Err(ServiceError::Validation(
            "status must be 'reviewing' or 'dismissed'".into(),
        ));
    }
    let found = get_report(db, id).await?;
    let current = ReportStatus::parse(&found.status)?;
    if matches!(current, ReportStatus::Converted | ReportStatus::Dismissed) {
        return Err(ServiceError::Conflict(format!("report is already {}", found.status)));
    }

    let mut am: client_report::ActiveModel = found.into();
    am.status = Set(target.as_str().into());
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(report_id = %id, status = %updated.status, "report_status_changed");
    Ok(updated)
}

/// Convert an open or reviewing report into a request. The report is marked
/// `converted` and keeps a pointer to the new request.
#[instrument(skip(db, request_input))]
pub async fn convert_to_request(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
    request_input: CreateRequestInput,
) -> Result<(client_report::Model, RequestOutcome), ServiceError> {
    let found = get_report(db, id).await?;
    let current = ReportStatus::parse(&found.status)?;
    if matches!(current, ReportStatus::Converted | ReportStatus::Dismissed) {
        return Err(ServiceError::Conflict(format!("report is already {}", found.status)));
    }
    if request_input.client_id != found.client_id {
        return Err(ServiceError::Validation(
            "request must target the report's client".into(),
        ));
    }

    let outcome = request_service::create_request(db, actor, request_input).await?;

    let mut am: client_report::ActiveModel = found.into();
    am.status = Set(ReportStatus::Converted.as_str().into());
    am.request_id = Set(Some(outcome.request.id));
    am.updated_at = Set(Utc::now().into());
    let converted = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    info!(report_id = %id, request_id = %outcome.request.id, "report_converted");
    Ok((converted, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_category, make_client, make_user};
    use models::{area, role, request};

    fn staff(u: &models::user::Model) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role::STAFF.into(), area: area::DESIGN.into() }
    }

    #[tokio::test]
    async fn urgent_report_notifies_pautador() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let filer = make_user(&db, role::STAFF, area::ADMINISTRATION).await?;
        let client_row = make_client(&db, pautador.id).await?;

        create_report(
            &db,
            &staff(&filer),
            CreateReportInput {
                client_id: client_row.id,
                report_type: "incident".into(),
                priority: "urgent".into(),
                description: "Campaign is down".into(),
            },
        )
        .await?;

        let inbox = notification_service::list_for_user(
            &db,
            pautador.id,
            true,
            common::pagination::Pagination::default(),
        )
        .await?;
        assert!(inbox.iter().any(|n| n.kind == notification::KIND_REPORT));
        Ok(())
    }

    #[tokio::test]
    async fn convert_links_report_and_request() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let filer = make_user(&db, role::STAFF, area::ADMINISTRATION).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let cat = make_category(&db, area::DESIGN, Some(1_500), false).await?;
        let actor = staff(&filer);

        let report = create_report(
            &db,
            &actor,
            CreateReportInput {
                client_id: client_row.id,
                report_type: "change_request".into(),
                priority: "normal".into(),
                description: "New banner needed".into(),
            },
        )
        .await?;

        let (converted, outcome) = convert_to_request(
            &db,
            &actor,
            report.id,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Banner from report".into(),
                description: "New banner needed".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await?;
        assert_eq!(converted.status, "converted");
        assert_eq!(converted.request_id, Some(outcome.request.id));

        // converting again is rejected
        let err = convert_to_request(
            &db,
            &actor,
            report.id,
            CreateRequestInput {
                client_id: client_row.id,
                category_id: cat.id,
                title: "Again".into(),
                description: "dup".into(),
                detail: None,
                cost_cents: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        request::Entity::delete_by_id(outcome.request.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn dismissed_report_is_frozen() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let filer = make_user(&db, role::STAFF, area::ADMINISTRATION).await?;
        let client_row = make_client(&db, pautador.id).await?;
        let actor = staff(&filer);

        let report = create_report(
            &db,
            &actor,
            CreateReportInput {
                client_id: client_row.id,
                report_type: "complaint".into(),
                priority: "low".into(),
                description: "Minor gripe".into(),
            },
        )
        .await?;

        update_status(&db, &actor, report.id, "dismissed").await?;
        let err = update_status(&db, &actor, report.id, "reviewing").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }
}
