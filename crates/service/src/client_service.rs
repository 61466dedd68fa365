//! Client accounts: creation, staffing assignments and activation toggling.
//! Managers and admins own this surface.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::{area, client, user};

use crate::actor::Actor;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClientInput {
    pub name: String,
    pub contact_email: String,
    pub pautador_id: Uuid,
    #[serde(default)]
    pub disenador_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientInput {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub pautador_id: Option<Uuid>,
    /// `Some(None)` clears the designer.
    pub disenador_id: Option<Option<Uuid>>,
}

/// Check that the referenced user exists, is not deleted, and sits in the
/// expected area.
async fn check_staff(
    db: &DatabaseConnection,
    user_id: Uuid,
    expected_area: &str,
    label: &str,
) -> Result<(), ServiceError> {
    let u = user::Entity::find_by_id(user_id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::Validation(format!("{} user not found", label)))?;
    let area_row = area::Entity::find_by_id(u.area_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::Db("area row missing".into()))?;
    if area_row.name != expected_area {
        return Err(ServiceError::Validation(format!(
            "{} must belong to the {} area",
            label, expected_area
        )));
    }
    Ok(())
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_client(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreateClientInput,
) -> Result<client::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("create clients"));
    }
    check_staff(db, input.pautador_id, area::AD_BUYING, "pautador").await?;
    if let Some(disenador) = input.disenador_id {
        check_staff(db, disenador, area::DESIGN, "disenador").await?;
    }
    let created = client::create(
        db,
        &input.name,
        &input.contact_email,
        input.pautador_id,
        input.disenador_id,
    )
    .await?;
    info!(client_id = %created.id, "client_created");
    Ok(created)
}

pub async fn get_client(db: &DatabaseConnection, id: Uuid) -> Result<client::Model, ServiceError> {
    client::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("client"))
}

pub async fn list_clients(
    db: &DatabaseConnection,
    active_only: bool,
    opts: Pagination,
) -> Result<Vec<client::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = client::Entity::find();
    if active_only {
        query = query.filter(client::Column::Active.eq(true));
    }
    query
        .order_by_asc(client::Column::Name)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

#[instrument(skip(db, input))]
pub async fn update_client(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
    input: UpdateClientInput,
) -> Result<client::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("edit clients"));
    }
    let found = get_client(db, id).await?;
    let mut am: client::ActiveModel = found.into();

    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name required".into()));
        }
        am.name = Set(name);
    }
    if let Some(email) = input.contact_email {
        if !email.contains('@') {
            return Err(ServiceError::Validation("invalid contact email".into()));
        }
        am.contact_email = Set(email);
    }
    if let Some(pautador) = input.pautador_id {
        check_staff(db, pautador, area::AD_BUYING, "pautador").await?;
        am.pautador_id = Set(pautador);
    }
    if let Some(disenador) = input.disenador_id {
        if let Some(d) = disenador {
            check_staff(db, d, area::DESIGN, "disenador").await?;
        }
        am.disenador_id = Set(disenador);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(client_id = %id, "client_updated");
    Ok(updated)
}

/// Toggle activation. Inactive clients keep their history but reject new
/// requests.
#[instrument(skip(db))]
pub async fn set_client_active(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
    active: bool,
) -> Result<client::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("toggle client activation"));
    }
    let updated = client::set_active(db, id, active).await?;
    info!(client_id = %id, active, "client_activation_changed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_user};
    use models::role;

    fn manager(u: &user::Model) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role::MANAGER.into(), area: area::ADMINISTRATION.into() }
    }

    fn staff(u: &user::Model) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role::STAFF.into(), area: area::DESIGN.into() }
    }

    #[tokio::test]
    async fn pautador_must_sit_in_ad_buying() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let boss = make_user(&db, role::MANAGER, area::ADMINISTRATION).await?;
        let designer = make_user(&db, role::STAFF, area::DESIGN).await?;

        let err = create_client(
            &db,
            &manager(&boss),
            CreateClientInput {
                name: format!("acme_{}", Uuid::new_v4()),
                contact_email: "ops@acme.test".into(),
                pautador_id: designer.id,
                disenador_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn staff_cannot_create_clients() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let worker = make_user(&db, role::STAFF, area::DESIGN).await?;
        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;

        let err = create_client(
            &db,
            &staff(&worker),
            CreateClientInput {
                name: "nope".into(),
                contact_email: "x@y.z".into(),
                pautador_id: pautador.id,
                disenador_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        Ok(())
    }

    #[tokio::test]
    async fn deactivate_then_reactivate() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let boss = make_user(&db, role::MANAGER, area::ADMINISTRATION).await?;
        let pautador = make_user(&db, role::STAFF, area::AD_BUYING).await?;
        let c = create_client(
            &db,
            &manager(&boss),
            CreateClientInput {
                name: format!("toggle_{}", Uuid::new_v4()),
                contact_email: "t@t.test".into(),
                pautador_id: pautador.id,
                disenador_id: None,
            },
        )
        .await?;

        let off = set_client_active(&db, &manager(&boss), c.id, false).await?;
        assert!(!off.active);
        let on = set_client_active(&db, &manager(&boss), c.id, true).await?;
        assert!(on.active);
        Ok(())
    }
}
