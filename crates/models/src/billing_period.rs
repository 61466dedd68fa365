use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client;
use crate::errors;

/// Lifecycle of a billing period. One-way: open -> closed -> invoiced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Open,
    Closed,
    Invoiced,
}

impl PeriodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Open => "open",
            PeriodStatus::Closed => "closed",
            PeriodStatus::Invoiced => "invoiced",
        }
    }

    pub fn parse(s: &str) -> Result<Self, errors::ModelError> {
        match s {
            "open" => Ok(PeriodStatus::Open),
            "closed" => Ok(PeriodStatus::Closed),
            "invoiced" => Ok(PeriodStatus::Invoiced),
            other => Err(errors::ModelError::Validation(format!("unknown period status '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_period")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub request_count: i32,
    pub total_cost_cents: i64,
    pub status: String,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub invoiced_at: Option<DateTimeWithTimeZone>,
    pub computed_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Client,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Client => Entity::belongs_to(client::Entity)
                .from(Column::ClientId)
                .to(client::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Result<PeriodStatus, errors::ModelError> {
        PeriodStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::PeriodStatus;

    #[test]
    fn status_roundtrip() {
        for s in ["open", "closed", "invoiced"] {
            assert_eq!(PeriodStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(PeriodStatus::parse("reopened").is_err());
    }
}
