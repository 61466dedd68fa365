use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::{category, client, user};

/// Lifecycle states of a live request. Terminal states (`Resolved`,
/// `Cancelled`) never persist in the live table; reaching one archives the
/// row into `request_history`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Pending,
    InProgress,
    Paused,
    Resolved,
    Cancelled,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "pending",
            RequestState::InProgress => "in_progress",
            RequestState::Paused => "paused",
            RequestState::Resolved => "resolved",
            RequestState::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, errors::ModelError> {
        match s {
            "pending" => Ok(RequestState::Pending),
            "in_progress" => Ok(RequestState::InProgress),
            "paused" => Ok(RequestState::Paused),
            "resolved" => Ok(RequestState::Resolved),
            "cancelled" => Ok(RequestState::Cancelled),
            other => Err(errors::ModelError::Validation(format!("unknown request state '{}'", other))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Resolved | RequestState::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub assignee_id: Option<Uuid>,
    pub state: String,
    pub title: String,
    pub description: String,
    pub detail: Option<String>,
    pub cost_cents: i64,
    pub accepted_at: Option<DateTimeWithTimeZone>,
    pub accumulated_secs: i64,
    pub timer_active: bool,
    pub timer_started_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Client,
    Category,
    Creator,
    Assignee,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Client => Entity::belongs_to(client::Entity)
                .from(Column::ClientId)
                .to(client::Column::Id)
                .into(),
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
            Relation::Creator => Entity::belongs_to(user::Entity)
                .from(Column::CreatedBy)
                .to(user::Column::Id)
                .into(),
            Relation::Assignee => Entity::belongs_to(user::Entity)
                .from(Column::AssigneeId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn state(&self) -> Result<RequestState, errors::ModelError> {
        RequestState::parse(&self.state)
    }

    /// Elapsed working time at `now`: accumulated seconds plus the running
    /// span when the timer is active. Computed lazily, never written back.
    pub fn elapsed_secs_at(&self, now: DateTime<Utc>) -> i64 {
        let mut total = self.accumulated_secs;
        if self.timer_active {
            if let Some(started) = self.timer_started_at {
                let running = (now - started.with_timezone(&Utc)).num_seconds();
                total += running.max(0);
            }
        }
        total
    }

    pub fn elapsed_secs(&self) -> i64 {
        self.elapsed_secs_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_model() -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            assignee_id: None,
            state: "pending".into(),
            title: "t".into(),
            description: "d".into(),
            detail: None,
            cost_cents: 0,
            accepted_at: None,
            accumulated_secs: 100,
            timer_active: false,
            timer_started_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn state_roundtrip() {
        for s in ["pending", "in_progress", "paused", "resolved", "cancelled"] {
            assert_eq!(RequestState::parse(s).unwrap().as_str(), s);
        }
        assert!(RequestState::parse("bogus").is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(RequestState::Resolved.is_terminal());
        assert!(RequestState::Cancelled.is_terminal());
        assert!(!RequestState::Paused.is_terminal());
    }

    #[test]
    fn elapsed_without_timer_is_accumulated() {
        let m = base_model();
        assert_eq!(m.elapsed_secs_at(Utc::now()), 100);
    }

    #[test]
    fn elapsed_with_running_timer_extrapolates() {
        let now = Utc::now();
        let mut m = base_model();
        m.timer_active = true;
        m.timer_started_at = Some((now - Duration::seconds(50)).into());
        assert_eq!(m.elapsed_secs_at(now), 150);
    }

    #[test]
    fn elapsed_never_goes_backwards_on_clock_skew() {
        let now = Utc::now();
        let mut m = base_model();
        m.timer_active = true;
        m.timer_started_at = Some((now + Duration::seconds(30)).into());
        assert_eq!(m.elapsed_secs_at(now), 100);
    }
}
