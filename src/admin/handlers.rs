use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{NewRoute, RouteDefinition, RouteId, RoutePatch};

// Ids that are not unsigned integers can never exist in the store.
fn parse_id(raw: &str) -> Option<RouteId> {
    raw.trim().parse().ok()
}

pub async fn list_routes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RouteDefinition>>, ApiError> {
    metrics::record_admin_operation("list");
    Ok(Json(state.store.list().await?))
}

pub async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteDefinition>, ApiError> {
    metrics::record_admin_operation("get");
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(state.store.get(id).await?))
}

pub async fn create_route(
    State(state): State<AppState>,
    payload: Result<Json<NewRoute>, JsonRejection>,
) -> Result<(StatusCode, Json<RouteDefinition>), ApiError> {
    metrics::record_admin_operation("create");
    let Json(new_route) = payload?;
    let created = state.store.create(new_route).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RoutePatch>, JsonRejection>,
) -> Result<Json<RouteDefinition>, ApiError> {
    metrics::record_admin_operation("update");
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    let Json(patch) = payload?;
    Ok(Json(state.store.update(id, patch).await?))
}

/// Deletion is idempotent: 204 whether or not the id existed.
pub async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    metrics::record_admin_operation("delete");
    if let Some(id) = parse_id(&id) {
        state.store.delete(id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
