//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in the `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod actor;
pub mod errors;
pub mod period;
pub mod auth;
pub mod user_service;
pub mod client_service;
pub mod category_service;
pub mod request_service;
pub mod stats_service;
pub mod billing_service;
pub mod notification_service;
pub mod report_service;
pub mod audit_service;
#[cfg(test)]
pub mod test_support;
