use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::future::BoxFuture;
use saferoute_core::{
    DetourPipeline, Error, GeoCoordinate, HazardCatalog, HazardSite, PipelineConfig, RawRoute,
    RetryPolicy, RouteClient, RouteRequest,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use crate::{api, state::AppState};

/// Answers the unconstrained call with `baseline` and the avoiding call with
/// `detour`.
struct StubClient {
    baseline: Result<RawRoute, Error>,
    detour: Result<RawRoute, Error>,
    calls: Mutex<Vec<RouteRequest>>,
}

impl RouteClient for StubClient {
    fn directions<'a>(&'a self, request: &'a RouteRequest) -> BoxFuture<'a, Result<RawRoute, Error>> {
        let mut calls = self.calls.lock().unwrap();
        let reply = if calls.is_empty() {
            self.baseline.clone()
        } else {
            self.detour.clone()
        };
        calls.push(request.clone());
        Box::pin(async move { reply })
    }
}

fn walking_route() -> RawRoute {
    RawRoute::new(vec![
        vec![-3.71448, 40.43312],
        vec![-3.71200, 40.43435],
        vec![-3.70942, 40.43558],
    ])
}

fn setup_app(
    detour: Result<RawRoute, Error>,
    hazards: Vec<HazardSite>,
) -> (axum::Router, Arc<StubClient>) {
    let client = Arc::new(StubClient {
        baseline: Ok(walking_route()),
        detour,
        calls: Mutex::new(Vec::new()),
    });
    let config = PipelineConfig {
        retry: RetryPolicy::no_retry(),
        ..PipelineConfig::default()
    };
    let pipeline = DetourPipeline::new(config, client.clone(), HazardCatalog::from_sites(hazards))
        .expect("pipeline");
    let state = Arc::new(AppState::new(pipeline));
    (api::routes().with_state(state), client)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value, Option<String>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body, request_id)
}

#[tokio::test]
async fn health_check() {
    let (app, _) = setup_app(Ok(walking_route()), Vec::new());
    let (status, body, request_id) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
    assert!(request_id.is_some());
}

#[tokio::test]
async fn safe_route_returns_geojson_feature() {
    let (app, client) = setup_app(Ok(walking_route()), Vec::new());
    let (status, body, _) = get(
        app,
        "/v1/routes/safe?origin=-3.7145,40.4331&destination=-3.7094,40.4356",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    let coords = body["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(coords.first().unwrap(), &json!([-3.7145, 40.4331]));
    assert_eq!(coords.last().unwrap(), &json!([-3.7094, 40.4356]));
    assert_eq!(client.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn path_form_matches_query_form() {
    let (app, _) = setup_app(Ok(walking_route()), Vec::new());
    let (status, body, _) = get(
        app,
        "/routes/origin=-3.714517,40.433050&destination=-3.709389,40.435584",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let coords = body["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(coords.first().unwrap(), &json!([-3.714517, 40.43305]));
    assert_eq!(coords.last().unwrap(), &json!([-3.709389, 40.435584]));
}

#[tokio::test]
async fn nearby_hazard_is_sent_as_avoid_polygon() {
    let hazard = HazardSite {
        location: GeoCoordinate::new(-3.71200, 40.43435),
        radius_m: 50.0,
    };
    let (app, client) = setup_app(Ok(walking_route()), vec![hazard]);
    let (status, _, _) = get(
        app,
        "/v1/routes/safe?origin=-3.7145,40.4331&destination=-3.7094,40.4356",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = client.calls.lock().unwrap();
    assert!(calls[0].avoid.is_empty());
    assert_eq!(calls[1].avoid.len(), 1);
}

#[tokio::test]
async fn bad_coordinates_are_rejected_without_routing() {
    let (app, client) = setup_app(Ok(walking_route()), Vec::new());
    let (status, body, _) = get(
        app,
        "/v1/routes/safe?origin=-3.7145,140.4331&destination=-3.7094,40.4356",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_coordinate");
    assert_eq!(body["class"], "bad_input");
    assert_eq!(body["stage"], "received");
    assert!(client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_destination_is_bad_input() {
    let (app, _) = setup_app(Ok(walking_route()), Vec::new());
    let (status, body, _) = get(app, "/v1/routes/safe?origin=-3.7145,40.4331").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("destination"));
}

#[tokio::test]
async fn no_route_is_distinct_from_server_error() {
    let (app, _) = setup_app(
        Err(Error::NoRouteFound("avoid polygons block every path".into())),
        Vec::new(),
    );
    let (status, body, _) = get(
        app,
        "/v1/routes/safe?origin=-3.7145,40.4331&destination=-3.7094,40.4356",
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no_route_found");
    assert_eq!(body["class"], "no_solution");
    assert_eq!(body["stage"], "detour_routed");
    assert!(body.get("geometry").is_none());
}

#[tokio::test]
async fn upstream_outage_is_service_unavailable() {
    let (app, _) = setup_app(
        Err(Error::ServiceUnavailable("HTTP 502".into())),
        Vec::new(),
    );
    let (status, body, _) = get(
        app,
        "/v1/routes/safe?origin=-3.7145,40.4331&destination=-3.7094,40.4356",
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["class"], "upstream_unavailable");
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let (app, _) = setup_app(Ok(walking_route()), Vec::new());
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-123"
    );
}

#[tokio::test]
async fn blank_request_id_is_replaced() {
    let (app, _) = setup_app(Ok(walking_route()), Vec::new());
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "   ")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "{id}");
}
