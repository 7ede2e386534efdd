//! Catch-all handler replaying stored definitions.

use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::http::RequestIdExt;
use crate::observability::metrics;
use crate::routing::matcher::{find_route, MatchOutcome};
use crate::store::RouteDefinition;

/// Serve any request not claimed by the admin interface or the liveness check.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers.request_id().to_string();
    let path = uri.path();

    let routes = match state.store.list().await {
        Ok(routes) => routes,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to load routes for dispatch");
            metrics::record_dispatch("error", 500, start_time);
            return ApiError::from(e).into_response();
        }
    };

    match find_route(&routes, method.as_str(), path) {
        MatchOutcome::Matched(route) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route_id = route.id,
                status = route.status,
                "Mock route matched"
            );
            let response = render(route);
            metrics::record_dispatch("hit", response.status().as_u16(), start_time);
            response
        }
        MatchOutcome::NoMatch => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "No mock route matched");
            metrics::record_dispatch("miss", 404, start_time);
            ApiError::NotFound.into_response()
        }
        MatchOutcome::Reserved => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Admin path refused by dispatcher");
            metrics::record_dispatch("reserved", 404, start_time);
            ApiError::NotFound.into_response()
        }
    }
}

/// Build the response described by `route`.
fn render(route: &RouteDefinition) -> Response {
    let status = match StatusCode::from_u16(route.status) {
        Ok(status) if !status.is_informational() => status,
        _ => {
            tracing::error!(route_id = route.id, status = route.status, "Stored status cannot be replayed");
            return ApiError::Internal(format!("route {} has an invalid status", route.id))
                .into_response();
        }
    };

    let mut response = (status, Json(&route.response)).into_response();

    for (name, value) in route.headers.iter().flatten() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => {
                tracing::warn!(route_id = route.id, header = %name, "Skipping invalid stored header");
            }
        }
    }

    response
}
