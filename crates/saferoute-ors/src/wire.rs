//! ORS directions payloads and error mapping.

use saferoute_core::{BufferPolygon, Error, RawRoute, RouteRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ORS error code: no route between the points under the given options.
pub const ROUTE_NOT_FOUND: i64 = 2009;
/// ORS error code: a point could not be snapped to the routable network.
pub const POINT_NOT_FOUND: i64 = 2010;

#[derive(Debug, Serialize)]
pub struct DirectionsBody {
    pub coordinates: Vec<[f64; 2]>,
    pub preference: &'static str,
    pub geometry_simplify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<DirectionsOptions>,
}

#[derive(Debug, Serialize)]
pub struct DirectionsOptions {
    pub avoid_polygons: MultiPolygonGeometry,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename = "MultiPolygon")]
pub struct MultiPolygonGeometry {
    pub coordinates: Vec<Vec<Vec<[f64; 2]>>>,
}

impl MultiPolygonGeometry {
    pub fn from_polygons(polygons: &[BufferPolygon]) -> Self {
        Self {
            coordinates: polygons
                .iter()
                .map(|polygon| vec![polygon.positions()])
                .collect(),
        }
    }
}

impl DirectionsBody {
    pub fn from_request(request: &RouteRequest) -> Self {
        let options = (!request.avoid.is_empty()).then(|| DirectionsOptions {
            avoid_polygons: MultiPolygonGeometry::from_polygons(&request.avoid),
        });
        Self {
            coordinates: vec![request.origin.to_position(), request.destination.to_position()],
            preference: request.preference.as_str(),
            geometry_simplify: true,
            options,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
struct DirectionsFeature {
    geometry: Option<LineGeometry>,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<Vec<f64>>,
}

/// Pull the first route geometry out of a GeoJSON directions reply.
pub fn parse_directions(body: &str) -> Result<RawRoute, Error> {
    let response: DirectionsResponse = serde_json::from_str(body)
        .map_err(|err| Error::ServiceUnavailable(format!("unparseable directions reply: {err}")))?;
    let route = response
        .features
        .into_iter()
        .next()
        .and_then(|feature| feature.geometry)
        .map(|geometry| RawRoute::new(geometry.coordinates))
        .ok_or_else(|| Error::ServiceUnavailable("directions reply has no route geometry".into()))?;
    if route.coordinates.len() < 2 {
        return Err(Error::ServiceUnavailable(format!(
            "directions reply geometry has {} position(s)",
            route.coordinates.len()
        )));
    }
    Ok(route)
}

/// Map a non-success ORS reply onto the routing failure taxonomy.
pub fn classify_failure(status: u16, body: &str) -> Error {
    let (code, message) = error_details(body);
    let detail = match code {
        Some(code) => format!("HTTP {status}, ORS code {code}: {message}"),
        None => format!("HTTP {status}: {message}"),
    };

    match (status, code) {
        (_, Some(ROUTE_NOT_FOUND | POINT_NOT_FOUND)) => Error::NoRouteFound(detail),
        (429, _) | (500..=599, _) => Error::ServiceUnavailable(detail),
        (400..=499, _) => Error::InvalidRequest(detail),
        _ => Error::ServiceUnavailable(detail),
    }
}

/// ORS answers `{"error": {"code": n, "message": "..."}}`, or sometimes
/// `{"error": "..."}` from the gateway.
fn error_details(body: &str) -> (Option<i64>, String) {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return (None, truncate(body.trim()));
    };
    match payload.get("error") {
        Some(Value::Object(error)) => (
            error.get("code").and_then(Value::as_i64),
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
        ),
        Some(Value::String(message)) => (None, message.clone()),
        _ => (None, truncate(body.trim())),
    }
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
