use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{client, user};

/// Archived copy of a terminal request. `origin_request_id` is the lineage to
/// the deleted live row and is unique: archival produces exactly one history
/// row per request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub origin_request_id: Uuid,
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub assignee_id: Option<Uuid>,
    pub final_state: String,
    pub title: String,
    pub description: String,
    pub cost_cents: i64,
    pub accepted_at: Option<DateTimeWithTimeZone>,
    pub resolved_at: DateTimeWithTimeZone,
    pub total_secs: i64,
    pub created_at: DateTimeWithTimeZone,
    pub archived_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Client,
    Assignee,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Client => Entity::belongs_to(client::Entity)
                .from(Column::ClientId)
                .to(client::Column::Id)
                .into(),
            Relation::Assignee => Entity::belongs_to(user::Entity)
                .from(Column::AssigneeId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
