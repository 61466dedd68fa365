use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::{client, request};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl ReportPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPriority::Low => "low",
            ReportPriority::Normal => "normal",
            ReportPriority::High => "high",
            ReportPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Result<Self, errors::ModelError> {
        match s {
            "low" => Ok(ReportPriority::Low),
            "normal" => Ok(ReportPriority::Normal),
            "high" => Ok(ReportPriority::High),
            "urgent" => Ok(ReportPriority::Urgent),
            other => Err(errors::ModelError::Validation(format!("unknown priority '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    Reviewing,
    Converted,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::Reviewing => "reviewing",
            ReportStatus::Converted => "converted",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, errors::ModelError> {
        match s {
            "open" => Ok(ReportStatus::Open),
            "reviewing" => Ok(ReportStatus::Reviewing),
            "converted" => Ok(ReportStatus::Converted),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(errors::ModelError::Validation(format!("unknown report status '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub report_type: String,
    pub priority: String,
    pub status: String,
    pub description: String,
    /// Set when the report was converted into a request.
    pub request_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Client,
    Request,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Client => Entity::belongs_to(client::Entity)
                .from(Column::ClientId)
                .to(client::Column::Id)
                .into(),
            Relation::Request => Entity::belongs_to(request::Entity)
                .from(Column::RequestId)
                .to(request::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_roundtrip() {
        for s in ["low", "normal", "high", "urgent"] {
            assert_eq!(ReportPriority::parse(s).unwrap().as_str(), s);
        }
        assert!(ReportPriority::parse("asap").is_err());
    }

    #[test]
    fn status_roundtrip() {
        for s in ["open", "reviewing", "converted", "dismissed"] {
            assert_eq!(ReportStatus::parse(s).unwrap().as_str(), s);
        }
    }
}
