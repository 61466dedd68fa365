//! Route handlers, one module per resource. Handlers stay thin: unwrap the
//! actor extension, call the service, wrap the result in the JSON envelope,
//! and push realtime events where a mutation produced any.

pub mod audit;
pub mod billing;
pub mod categories;
pub mod clients;
pub mod notifications;
pub mod reports;
pub mod requests;
pub mod stats;
pub mod users;
