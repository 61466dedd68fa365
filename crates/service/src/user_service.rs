//! User administration: listing, profile updates, soft deletion and presence.
//! Registration itself lives in the auth module.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::{area, role, user};

use crate::actor::Actor;
use crate::errors::ServiceError;

/// A user row with role/area resolved to names.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub area: String,
    pub presence: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    /// Role changes are admin-only.
    pub role: Option<String>,
    pub area: Option<String>,
}

async fn to_view(db: &DatabaseConnection, u: user::Model) -> Result<UserView, ServiceError> {
    let role_row = role::Entity::find_by_id(u.role_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::Db("role row missing".into()))?;
    let area_row = area::Entity::find_by_id(u.area_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::Db("area row missing".into()))?;
    Ok(UserView {
        id: u.id,
        email: u.email,
        name: u.name,
        role: role_row.name,
        area: area_row.name,
        presence: u.presence,
    })
}

async fn find_active(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))
}

pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<UserView, ServiceError> {
    let u = find_active(db, id).await?;
    to_view(db, u).await
}

/// List non-deleted users, newest first.
pub async fn list_users(
    db: &DatabaseConnection,
    opts: Pagination,
) -> Result<Vec<UserView>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let rows = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .order_by_desc(user::Column::CreatedAt)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let mut out = Vec::with_capacity(rows.len());
    for u in rows {
        out.push(to_view(db, u).await?);
    }
    Ok(out)
}

/// Update a user's profile. Users may rename themselves; role and area moves
/// require an admin.
#[instrument(skip(db, input))]
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
    input: UpdateUserInput,
) -> Result<UserView, ServiceError> {
    if actor.id != id && !actor.is_admin() {
        return Err(ServiceError::forbidden("edit another user"));
    }
    if (input.role.is_some() || input.area.is_some()) && !actor.is_admin() {
        return Err(ServiceError::forbidden("change role or area"));
    }

    let found = find_active(db, id).await?;
    let mut am: user::ActiveModel = found.into();

    if let Some(name) = input.name {
        user::validate_name(&name)?;
        am.name = Set(name);
    }
    if let Some(role_name) = input.role {
        let role_row = role::find_by_name(db, &role_name).await?;
        am.role_id = Set(role_row.id);
    }
    if let Some(area_name) = input.area {
        let area_row = area::find_by_name(db, &area_name).await?;
        am.area_id = Set(area_row.id);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    info!(user_id = %id, "user_updated");
    to_view(db, updated).await
}

/// Soft-delete a user (admin only). The row stays for history joins.
#[instrument(skip(db))]
pub async fn deactivate_user(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<(), ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::forbidden("deactivate users"));
    }
    if actor.id == id {
        return Err(ServiceError::Validation("cannot deactivate yourself".into()));
    }
    find_active(db, id).await?;
    user::soft_delete(db, id).await?;
    info!(user_id = %id, "user_deactivated");
    Ok(())
}

/// Flip presence; driven by the WebSocket hub on connect/disconnect and by
/// explicit client updates.
pub async fn set_presence(
    db: &DatabaseConnection,
    id: Uuid,
    presence: &str,
) -> Result<(), ServiceError> {
    match presence {
        user::PRESENCE_OFFLINE | user::PRESENCE_ONLINE | user::PRESENCE_AWAY => {}
        other => {
            return Err(ServiceError::Validation(format!("unknown presence '{}'", other)));
        }
    }
    user::set_presence(db, id, presence).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_user};

    fn admin(u: &user::Model) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role::ADMIN.into(), area: area::ADMINISTRATION.into() }
    }

    fn staff(u: &user::Model) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role::STAFF.into(), area: area::DESIGN.into() }
    }

    #[tokio::test]
    async fn staff_cannot_change_roles() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let u = make_user(&db, role::STAFF, area::DESIGN).await?;
        let me = staff(&u);
        let err = update_user(
            &db,
            &me,
            u.id,
            UpdateUserInput { role: Some(role::ADMIN.into()), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // renaming self is fine
        let view = update_user(
            &db,
            &me,
            u.id,
            UpdateUserInput { name: Some("Renamed".into()), ..Default::default() },
        )
        .await?;
        assert_eq!(view.name, "Renamed");
        Ok(())
    }

    #[tokio::test]
    async fn deactivated_user_disappears_from_lookups() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let boss = make_user(&db, role::ADMIN, area::ADMINISTRATION).await?;
        let victim = make_user(&db, role::STAFF, area::DESIGN).await?;

        deactivate_user(&db, &admin(&boss), victim.id).await?;
        let err = get_user(&db, victim.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn presence_validates_value() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let u = make_user(&db, role::STAFF, area::DESIGN).await?;
        set_presence(&db, u.id, user::PRESENCE_ONLINE).await?;
        let view = get_user(&db, u.id).await?;
        assert_eq!(view.presence, user::PRESENCE_ONLINE);

        let err = set_presence(&db, u.id, "sleeping").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        Ok(())
    }
}
