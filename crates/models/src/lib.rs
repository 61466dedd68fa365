pub mod errors;
pub mod db;
pub mod role;
pub mod area;
pub mod user;
pub mod user_credentials;
pub mod client;
pub mod category;
pub mod request;
pub mod request_history;
pub mod billing_period;
pub mod user_statistic;
pub mod notification;
pub mod client_report;
pub mod audit_log;
