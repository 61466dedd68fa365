use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::area;
use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub area_id: Uuid,
    /// None marks a variable-cost category; requests must supply their own cost.
    pub fixed_cost_cents: Option<i64>,
    pub requires_detail: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Area,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Area => Entity::belongs_to(area::Entity)
                .from(Column::AreaId)
                .to(area::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_variable_cost(&self) -> bool {
        self.fixed_cost_cents.is_none()
    }
}

pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    area_id: Uuid,
    fixed_cost_cents: Option<i64>,
    requires_detail: bool,
) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("name required".into()));
    }
    if let Some(cost) = fixed_cost_cents {
        if cost < 0 {
            return Err(errors::ModelError::Validation("fixed cost must be >= 0".into()));
        }
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        area_id: Set(area_id),
        fixed_cost_cents: Set(fixed_cost_cents),
        requires_detail: Set(requires_detail),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
