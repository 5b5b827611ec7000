//! REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use saferoute_core::{Error, FailureClass, GeoCoordinate, PipelineFailure, PipelineStage, RouteResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::request_id::ensure_request_id;
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/routes/safe", get(safe_route))
        // Path-embedded form: /routes/origin=lng,lat&destination=lng,lat
        .route("/routes/:params", get(safe_route_from_path))
        .layer(middleware::from_fn(ensure_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Deserialize)]
pub struct SafeRouteQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

async fn safe_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SafeRouteQuery>,
) -> Result<Json<RouteResult>, ApiError> {
    let origin = parse_endpoint("origin", query.origin.as_deref())?;
    let destination = parse_endpoint("destination", query.destination.as_deref())?;
    compute(&state, origin, destination).await
}

async fn safe_route_from_path(
    State(state): State<Arc<AppState>>,
    Path(params): Path<String>,
) -> Result<Json<RouteResult>, ApiError> {
    let (origin, destination) = parse_route_params(&params)
        .map_err(|error| ApiError(PipelineFailure::new(PipelineStage::Received, error)))?;
    compute(&state, origin, destination).await
}

async fn compute(
    state: &AppState,
    origin: GeoCoordinate,
    destination: GeoCoordinate,
) -> Result<Json<RouteResult>, ApiError> {
    let result = state.pipeline().run(origin, destination).await?;
    Ok(Json(result))
}

fn parse_endpoint(name: &str, raw: Option<&str>) -> Result<GeoCoordinate, ApiError> {
    raw.ok_or_else(|| Error::InvalidCoordinate(format!("missing {name}")))
        .and_then(str::parse)
        .map_err(|error| ApiError(PipelineFailure::new(PipelineStage::Received, error)))
}

/// Parse `origin=lng,lat&destination=lng,lat` (parameter order free).
pub fn parse_route_params(params: &str) -> Result<(GeoCoordinate, GeoCoordinate), Error> {
    let mut origin = None;
    let mut destination = None;
    for pair in params.split('&').filter(|pair| !pair.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(Error::InvalidCoordinate(format!(
                "malformed parameter {pair:?}"
            )));
        };
        match key.trim() {
            "origin" => origin = Some(value.parse::<GeoCoordinate>()?),
            "destination" => destination = Some(value.parse::<GeoCoordinate>()?),
            _ => {}
        }
    }

    match (origin, destination) {
        (Some(origin), Some(destination)) => Ok((origin, destination)),
        (None, _) => Err(Error::InvalidCoordinate("missing origin".into())),
        (_, None) => Err(Error::InvalidCoordinate("missing destination".into())),
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    class: FailureClass,
    stage: PipelineStage,
    message: String,
}

/// A failed pipeline run rendered as a structured JSON reply.
#[derive(Debug)]
pub struct ApiError(pub PipelineFailure);

impl From<PipelineFailure> for ApiError {
    fn from(value: PipelineFailure) -> Self {
        Self(value)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.error.class() {
            FailureClass::BadInput => StatusCode::BAD_REQUEST,
            FailureClass::NoSolution => StatusCode::UNPROCESSABLE_ENTITY,
            FailureClass::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            FailureClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let PipelineFailure { stage, error } = self.0;
        if status.is_server_error() {
            tracing::warn!(%stage, error = %error, "detour request failed");
        } else {
            tracing::info!(%stage, error = %error, "detour request rejected");
        }

        let body = ErrorBody {
            error: error.kind(),
            class: error.class(),
            stage,
            message: error.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
