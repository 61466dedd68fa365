//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration and login business logic lives here, independent of the web
//! framework; token claims are shared with the server's auth middleware.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod repo;
pub mod service;
pub mod token;

pub use service::AuthService;
