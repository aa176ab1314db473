use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Config,
    nws::{ErrorKind, ForecastBundle, NwsClient, NwsError},
    weather::{build_weather, Weather},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub nws: Arc<NwsClient>,
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationQuery {
    fn resolve(&self, config: &Config) -> (f64, f64) {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => (config.default_lat, config.default_lng),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct AboutResponse {
    pub title: String,
    pub version: String,
    pub search_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub step: String,
    pub status: u16,
    pub title: String,
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: NwsError) -> ApiError {
    tracing::error!("weather lookup failed: {}", err);

    let status = err.status();
    let (title, detail) = match &err.kind {
        ErrorKind::UpstreamStatus(problem) => (problem.title.clone(), problem.detail.clone()),
        other => ("Weather Unavailable".to_string(), other.to_string()),
    };

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse {
            step: err.endpoint.to_string(),
            status,
            title,
            detail,
        }),
    )
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn about(State(state): State<AppState>) -> Json<AboutResponse> {
    Json(AboutResponse {
        title: "about".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        search_enabled: state.config.search_enabled(),
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<Weather>, ApiError> {
    let (lat, lng) = params.resolve(&state.config);

    build_weather(&state.nws, lat, lng, state.config.search_enabled())
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_forecast_bundle(
    State(state): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<ForecastBundle>, ApiError> {
    let (lat, lng) = params.resolve(&state.config);

    state
        .nws
        .forecast_bundle(lat, lng)
        .await
        .map(Json)
        .map_err(error_response)
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_weather))
        .route("/health", get(health))
        .route("/about", get(about))
        .route("/weather", get(get_weather))
        .route("/forecast", get(get_forecast_bundle))
        .with_state(state)
}
