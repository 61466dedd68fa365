use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user performing an operation, as carried in the token
/// claims. Services use it for assignee and role checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub area: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == models::role::ADMIN
    }

    /// Managers and admins both clear manager gates.
    pub fn is_manager(&self) -> bool {
        self.role == models::role::MANAGER || self.is_admin()
    }
}
