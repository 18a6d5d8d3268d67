use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::{planner, profiles, sos};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use safemap_core::assessment::{assess_area, filter_area, AreaQuery};
use safemap_core::report::NewIncident;
use safemap_core::types::{CrimeCategory, DateRange, IncidentRecord, SafetyScore, Viewport};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Map filters as sent in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct AreaParams {
    pub north: Option<f64>,
    pub south: Option<f64>,
    pub east: Option<f64>,
    pub west: Option<f64>,
    pub range: Option<String>,
    /// Comma separated categories, e.g. `Theft,Assault`.
    pub types: Option<String>,
    pub limit: Option<usize>,
}

impl AreaParams {
    pub fn to_query(&self) -> ApiResult<AreaQuery> {
        let viewport = match (self.north, self.south, self.east, self.west) {
            (Some(north), Some(south), Some(east), Some(west)) => {
                Some(Viewport::new(north, south, east, west))
            }
            (None, None, None, None) => None,
            _ => {
                return Err(ApiError::BadRequest(
                    "north, south, east and west must be given together".to_string(),
                ))
            }
        };

        let range = match self.range.as_deref() {
            Some(text) => text.parse::<DateRange>()?,
            None => DateRange::AllTime,
        };

        let categories = self
            .types
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::parse::<CrimeCategory>)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(AreaQuery {
            viewport,
            range,
            categories,
        })
    }
}

#[derive(Serialize)]
struct SafetyResponse {
    #[serde(flatten)]
    safety: SafetyScore,
    count: usize,
    range: DateRange,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/categories", get(categories_handler))
        .route("/api/crimes", get(list_crimes_handler).post(report_crime_handler))
        .route("/api/crimes/:id", get(get_crime_handler))
        .route("/api/safety-score", get(safety_score_handler))
        .route("/api/profiles", post(profiles::create_profile))
        .route(
            "/api/profiles/:id",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route("/api/profiles/:id/contacts", get(profiles::list_contacts))
        .route("/api/profiles/:id/sos-events", get(sos::list_sos_events))
        .route("/api/profiles/:id/routes", get(planner::list_routes))
        .route("/api/contacts", post(profiles::create_contact))
        .route(
            "/api/contacts/:id",
            get(profiles::get_contact)
                .put(profiles::update_contact)
                .delete(profiles::delete_contact),
        )
        .route(
            "/api/sos",
            post(sos::trigger_sos).layer(DefaultBodyLimit::max(sos::SOS_BODY_LIMIT)),
        )
        .route(
            "/api/sos/trigger",
            post(sos::trigger_sos).layer(DefaultBodyLimit::max(sos::SOS_BODY_LIMIT)),
        )
        .route("/api/sos/:id", get(sos::get_sos))
        .route("/api/sos/:id/bundle", get(sos::export_bundle))
        .route("/api/sos/:id/resolve", post(sos::resolve_sos))
        .route("/api/routes", post(planner::plan_route))
        .route("/api/routes/:id", get(planner::get_route))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health())
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

async fn categories_handler() -> impl IntoResponse {
    Json(CrimeCategory::ALL.to_vec())
}

async fn list_crimes_handler(
    State(state): State<AppState>,
    params: Result<Query<AreaParams>, QueryRejection>,
) -> ApiResult<Json<Vec<IncidentRecord>>> {
    let Query(params) = params?;
    let query = params.to_query()?;

    let mut incidents = filter_area(&state.incidents.list(), &query, state.now());
    if let Some(limit) = params.limit {
        incidents.truncate(limit);
    }
    Ok(Json(incidents))
}

async fn report_crime_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewIncident>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IncidentRecord>)> {
    let Json(report) = payload?;
    let record = report.into_record(Uuid::new_v4().to_string())?;

    info!(
        "Incident {} reported: {} severity {} at {}",
        record.id, record.category, record.severity, record.point()
    );
    metrics::record_incident_reported(record.category);
    state.incidents.append(record.clone());

    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_crime_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<IncidentRecord>> {
    state
        .incidents
        .get(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("Incident"))
}

async fn safety_score_handler(
    State(state): State<AppState>,
    params: Result<Query<AreaParams>, QueryRejection>,
) -> ApiResult<Json<SafetyResponse>> {
    let Query(params) = params?;
    let query = params.to_query()?;

    let assessment = assess_area(&state.incidents.list(), &query, state.now());
    metrics::record_assessment(assessment.safety.score);

    Ok(Json(SafetyResponse {
        safety: assessment.safety,
        count: assessment.incidents.len(),
        range: query.range,
    }))
}
