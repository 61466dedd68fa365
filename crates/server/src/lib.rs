pub mod auth;
pub mod errors;
pub mod handlers;
pub mod realtime;
pub mod routes;
pub mod startup;

pub use startup::run;
