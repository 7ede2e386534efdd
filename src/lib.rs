//! Configurable mock-API server library.
//!
//! Operators register route definitions through `/admin/routes`; every
//! other request is matched against the registry and answered with the
//! stored status, headers and body.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::RouteStore;
