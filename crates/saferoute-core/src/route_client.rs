//! Contract for the external directions service.

use crate::error::Error;
use crate::models::{BufferPolygon, GeoCoordinate, RoutePath};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Travel mode understood by the directions service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    FootWalking,
    FootHiking,
    Wheelchair,
    CyclingRegular,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::FootWalking => "foot-walking",
            Profile::FootHiking => "foot-hiking",
            Profile::Wheelchair => "wheelchair",
            Profile::CyclingRegular => "cycling-regular",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Recommended,
    Fastest,
    Shortest,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preference::Recommended => "recommended",
            Preference::Fastest => "fastest",
            Preference::Shortest => "shortest",
        }
    }
}

/// One directions query. An empty `avoid` set means an unconstrained route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: GeoCoordinate,
    pub destination: GeoCoordinate,
    pub profile: Profile,
    pub preference: Preference,
    pub avoid: Vec<BufferPolygon>,
}

impl RouteRequest {
    pub fn new(origin: GeoCoordinate, destination: GeoCoordinate) -> Self {
        Self {
            origin,
            destination,
            profile: Profile::default(),
            preference: Preference::default(),
            avoid: Vec::new(),
        }
    }

    pub fn avoiding(mut self, avoid: Vec<BufferPolygon>) -> Self {
        self.avoid = avoid;
        self
    }
}

/// Path geometry exactly as the service returned it.
///
/// Positions may carry extra ordinates (elevation); they are coerced to
/// `[lng, lat]` by [`RawRoute::to_path`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRoute {
    pub coordinates: Vec<Vec<f64>>,
}

impl RawRoute {
    pub fn new(coordinates: Vec<Vec<f64>>) -> Self {
        Self { coordinates }
    }

    /// Upstream geometry as a route; anything short of two valid WGS84
    /// positions is a malformed reply.
    pub fn to_path(&self) -> Result<RoutePath, Error> {
        if self.coordinates.len() < 2 {
            return Err(Error::ServiceUnavailable(format!(
                "route geometry has {} position(s), need at least 2",
                self.coordinates.len()
            )));
        }
        self.coordinates
            .iter()
            .enumerate()
            .map(|(idx, position)| {
                let malformed = || {
                    Error::ServiceUnavailable(format!(
                        "malformed position #{idx} in route geometry: {position:?}"
                    ))
                };
                match position.as_slice() {
                    [lng, lat, ..] => {
                        GeoCoordinate::validated(*lng, *lat).map_err(|_| malformed())
                    }
                    _ => Err(malformed()),
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RoutePath::new)
    }
}

/// A walking-directions backend.
///
/// Implementations report `NoRouteFound` when the avoidance constraints
/// leave no path, `ServiceUnavailable` for transient trouble (timeouts,
/// 5xx, rate limiting) and `InvalidRequest` for requests the service
/// rejects. They never retry on their own.
pub trait RouteClient: Send + Sync {
    fn directions<'a>(&'a self, request: &'a RouteRequest) -> BoxFuture<'a, Result<RawRoute, Error>>;
}
