use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use safemap_core::records::{NewRoute, RouteRequest};
use safemap_core::route::{estimate_route, RouteOptions};
use tracing::info;
use uuid::Uuid;

pub async fn plan_route(
    State(state): State<AppState>,
    payload: Result<Json<NewRoute>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RouteRequest>)> {
    let Json(request) = payload?;
    request.validate()?;

    let options = RouteOptions {
        range: request.range,
        ..state.config.route_options
    };
    let estimate = estimate_route(
        request.origin,
        request.destination,
        &state.incidents.list(),
        &options,
        state.now(),
    );

    let route = RouteRequest {
        id: Uuid::new_v4().to_string(),
        user_id: request.user_id,
        origin: request.origin,
        destination: request.destination,
        origin_label: request.origin_label,
        destination_label: request.destination_label,
        range: request.range,
        estimate,
        created_at: Utc::now(),
    };

    info!(
        "Route {} planned: {:.2} km, {} incidents, score {}",
        route.id, route.estimate.distance_km, route.estimate.incident_count, route.estimate.safety.score
    );
    metrics::record_route_planned();
    state.routes.insert(route.id.clone(), route.clone());

    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RouteRequest>> {
    state
        .routes
        .get(&id)
        .map(|r| Json(r.value().clone()))
        .ok_or(ApiError::NotFound("Route"))
}

pub async fn list_routes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<RouteRequest>> {
    Json(state.routes_for(&user_id))
}
