//! Admin interface: CRUD over the route store.
//!
//! Each handler maps one-to-one onto a store operation and translates the
//! result into a status code. No business rules live here.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

pub const ROUTES_PATH: &str = "/admin/routes";
pub const ROUTE_PATH: &str = "/admin/routes/{id}";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(ROUTES_PATH, get(list_routes).post(create_route))
        .route(
            ROUTE_PATH,
            get(get_route).put(update_route).delete(delete_route),
        )
}
