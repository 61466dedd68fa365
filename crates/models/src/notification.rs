use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::user;

pub const KIND_REQUEST_CREATED: &str = "request_created";
pub const KIND_REQUEST_STATE: &str = "request_state";
pub const KIND_REPORT: &str = "report";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    kind: &str,
    message: &str,
) -> Result<Model, errors::ModelError> {
    if message.trim().is_empty() {
        return Err(errors::ModelError::Validation("message required".into()));
    }
    // id left unset, assigned by the DB sequence
    let am = ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind.to_string()),
        message: Set(message.to_string()),
        read: Set(false),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
