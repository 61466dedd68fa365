//! Service catalog: categories with either a fixed price or variable cost.
//! Price edits never rewrite existing requests; the catalog price is copied
//! at request creation time.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::pagination::Pagination;
use models::{area, audit_log, category};

use crate::actor::Actor;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub area: String,
    #[serde(default)]
    pub fixed_cost_cents: Option<i64>,
    #[serde(default)]
    pub requires_detail: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    /// `Some(None)` switches the category to variable cost.
    pub fixed_cost_cents: Option<Option<i64>>,
    pub requires_detail: Option<bool>,
}

#[instrument(skip(db, input), fields(name = %input.name, area = %input.area))]
pub async fn create_category(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreateCategoryInput,
) -> Result<category::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("manage the catalog"));
    }
    let area_row = area::find_by_name(db, &input.area).await?;
    let created = category::create(
        db,
        &input.name,
        area_row.id,
        input.fixed_cost_cents,
        input.requires_detail,
    )
    .await?;
    info!(category_id = %created.id, "category_created");
    Ok(created)
}

pub async fn get_category(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<category::Model, ServiceError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("category"))
}

pub async fn list_categories(
    db: &DatabaseConnection,
    area_name: Option<&str>,
    opts: Pagination,
) -> Result<Vec<category::Model>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let mut query = category::Entity::find();
    if let Some(name) = area_name {
        let area_row = area::find_by_name(db, name).await?;
        query = query.filter(category::Column::AreaId.eq(area_row.id));
    }
    query
        .order_by_asc(category::Column::Name)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Update the catalog entry. Price changes are audit-logged since they alter
/// what future requests will cost.
#[instrument(skip(db, input))]
pub async fn update_category(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
    input: UpdateCategoryInput,
) -> Result<category::Model, ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("manage the catalog"));
    }
    let found = get_category(db, id).await?;
    let old_cost = found.fixed_cost_cents;
    let mut am: category::ActiveModel = found.into();

    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name required".into()));
        }
        am.name = Set(name);
    }
    let mut cost_changed = false;
    if let Some(cost) = input.fixed_cost_cents {
        if let Some(c) = cost {
            if c < 0 {
                return Err(ServiceError::Validation("fixed cost must be >= 0".into()));
            }
        }
        cost_changed = cost != old_cost;
        am.fixed_cost_cents = Set(cost);
    }
    if let Some(requires) = input.requires_detail {
        am.requires_detail = Set(requires);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    if cost_changed {
        audit_log::append(
            db,
            "category",
            &id.to_string(),
            "fixed_cost_cents",
            old_cost.map(|c| c.to_string()),
            updated.fixed_cost_cents.map(|c| c.to_string()),
            Some(actor.id),
        )
        .await?;
    }
    info!(category_id = %id, "category_updated");
    Ok(updated)
}

/// Remove a catalog entry. Refused while any request, live or archived, still
/// references it.
#[instrument(skip(db))]
pub async fn delete_category(
    db: &DatabaseConnection,
    actor: &Actor,
    id: Uuid,
) -> Result<(), ServiceError> {
    if !actor.is_manager() {
        return Err(ServiceError::forbidden("manage the catalog"));
    }
    get_category(db, id).await?;

    let live = models::request::Entity::find()
        .filter(models::request::Column::CategoryId.eq(id))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let archived = models::request_history::Entity::find()
        .filter(models::request_history::Column::CategoryId.eq(id))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if live + archived > 0 {
        return Err(ServiceError::Conflict("category is referenced by requests".into()));
    }

    category::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(category_id = %id, "category_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_user};
    use models::role;

    fn manager(u: &models::user::Model) -> Actor {
        Actor { id: u.id, email: u.email.clone(), role: role::MANAGER.into(), area: area::ADMINISTRATION.into() }
    }

    #[tokio::test]
    async fn price_change_leaves_an_audit_trail() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let boss = make_user(&db, role::MANAGER, area::ADMINISTRATION).await?;
        let actor = manager(&boss);
        let cat = create_category(
            &db,
            &actor,
            CreateCategoryInput {
                name: format!("cat_{}", Uuid::new_v4()),
                area: area::DESIGN.into(),
                fixed_cost_cents: Some(1_000),
                requires_detail: false,
            },
        )
        .await?;

        let updated = update_category(
            &db,
            &actor,
            cat.id,
            UpdateCategoryInput { fixed_cost_cents: Some(Some(2_000)), ..Default::default() },
        )
        .await?;
        assert_eq!(updated.fixed_cost_cents, Some(2_000));

        let entries = audit_log::Entity::find()
            .filter(audit_log::Column::Entity.eq("category"))
            .filter(audit_log::Column::EntityId.eq(cat.id.to_string()))
            .all(&db)
            .await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_value.as_deref(), Some("1000"));
        assert_eq!(entries[0].new_value.as_deref(), Some("2000"));
        Ok(())
    }

    #[tokio::test]
    async fn switch_to_variable_cost() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let boss = make_user(&db, role::MANAGER, area::ADMINISTRATION).await?;
        let actor = manager(&boss);
        let cat = create_category(
            &db,
            &actor,
            CreateCategoryInput {
                name: format!("cat_{}", Uuid::new_v4()),
                area: area::AD_BUYING.into(),
                fixed_cost_cents: Some(500),
                requires_detail: false,
            },
        )
        .await?;

        let updated = update_category(
            &db,
            &actor,
            cat.id,
            UpdateCategoryInput { fixed_cost_cents: Some(None), ..Default::default() },
        )
        .await?;
        assert!(updated.is_variable_cost());
        Ok(())
    }
}
