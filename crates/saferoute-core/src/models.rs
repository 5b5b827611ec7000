//! Core data models for hazard-aware routing.

use crate::error::Error;
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lng: f64,
    pub lat: f64,
}

impl GeoCoordinate {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build a coordinate, rejecting anything outside the WGS84 ranges.
    pub fn validated(lng: f64, lat: f64) -> Result<Self, Error> {
        let coord = Self::new(lng, lat);
        coord.validate()?;
        Ok(coord)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::InvalidCoordinate(format!(
                "longitude {} outside [-180, 180]",
                self.lng
            )));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidCoordinate(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        Ok(())
    }

    /// GeoJSON position order.
    pub fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lng, self.lat)
    }
}

/// Parses the `"lng,lat"` text form used in query strings.
impl FromStr for GeoCoordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let (Some(lng), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::InvalidCoordinate(format!(
                "expected \"lng,lat\", got {s:?}"
            )));
        };
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::InvalidCoordinate(format!("longitude {lng:?} is not a number")))?;
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::InvalidCoordinate(format!("latitude {lat:?} is not a number")))?;
        Self::validated(lng, lat)
    }
}

impl From<GeoCoordinate> for Coord<f64> {
    fn from(value: GeoCoordinate) -> Self {
        Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

/// A position in a projected metric system (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCoordinate {
    pub easting: f64,
    pub northing: f64,
}

impl ProjectedCoordinate {
    pub const fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    pub fn distance_to(&self, other: &ProjectedCoordinate) -> f64 {
        (self.easting - other.easting).hypot(self.northing - other.northing)
    }
}

impl From<ProjectedCoordinate> for Coord<f64> {
    fn from(value: ProjectedCoordinate) -> Self {
        Coord {
            x: value.easting,
            y: value.northing,
        }
    }
}

/// A point to keep away from, with its avoidance radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardSite {
    pub location: GeoCoordinate,
    pub radius_m: f64,
}

/// Closed ring approximating a disk, in geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferPolygon {
    ring: Vec<GeoCoordinate>,
}

impl BufferPolygon {
    /// Wrap a ring, repeating the first vertex at the end when needed.
    pub fn from_ring(mut ring: Vec<GeoCoordinate>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self { ring }
    }

    pub fn ring(&self) -> &[GeoCoordinate] {
        &self.ring
    }

    pub fn is_closed(&self) -> bool {
        self.ring.len() >= 4 && self.ring.first() == self.ring.last()
    }

    /// Ring as `[lng, lat]` positions, ready for a GeoJSON polygon.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.ring.iter().map(|c| c.to_position()).collect()
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let exterior: LineString<f64> = self.ring.iter().map(|c| Coord::from(*c)).collect();
        Polygon::new(exterior, vec![])
    }
}

/// Ordered walkable path between two points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    pub coordinates: Vec<GeoCoordinate>,
}

impl RoutePath {
    pub fn new(coordinates: Vec<GeoCoordinate>) -> Self {
        Self { coordinates }
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn first(&self) -> Option<&GeoCoordinate> {
        self.coordinates.first()
    }

    pub fn last(&self) -> Option<&GeoCoordinate> {
        self.coordinates.last()
    }

    /// Pin the path to the exact requested endpoints.
    ///
    /// Directions engines return a simplified geometry that usually starts and
    /// ends at the snapped road position instead of the requested point.
    /// Exact duplicates are not added twice.
    pub fn with_endpoints(mut self, origin: GeoCoordinate, destination: GeoCoordinate) -> Self {
        if self.coordinates.first() != Some(&origin) {
            self.coordinates.insert(0, origin);
        }
        if self.coordinates.last() != Some(&destination) || self.coordinates.len() == 1 {
            self.coordinates.push(destination);
        }
        self
    }

    pub fn into_result(self) -> RouteResult {
        RouteResult {
            geometry: LineStringGeometry {
                coordinates: self.coordinates.iter().map(|c| c.to_position()).collect(),
            },
        }
    }
}

/// GeoJSON `Feature` wrapping the final route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct RouteResult {
    pub geometry: LineStringGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "LineString")]
pub struct LineStringGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteResult {
    pub fn coordinates(&self) -> &[[f64; 2]] {
        &self.geometry.coordinates
    }
}
