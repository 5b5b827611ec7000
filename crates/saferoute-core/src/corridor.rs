//! Buffered strip around a route, used to decide which hazards matter.

use crate::error::Error;
use crate::models::{GeoCoordinate, ProjectedCoordinate, RoutePath};
use crate::projection::UtmProjector;
use geo::{Coord, Distance, Euclidean, LineString, Point};

/// Every location within `width_m` meters of the route's polyline.
///
/// Membership is a metric distance test against the projected path, which is
/// exactly the point-in-buffer test for a round-capped line buffer.
#[derive(Debug, Clone)]
pub struct RouteCorridor {
    projector: UtmProjector,
    line: LineString<f64>,
    width_m: f64,
}

impl RouteCorridor {
    pub fn around(
        projector: &UtmProjector,
        path: &RoutePath,
        width_m: f64,
    ) -> Result<Self, Error> {
        if !width_m.is_finite() || width_m < 0.0 {
            return Err(Error::InvalidRadius(width_m));
        }
        let line = path
            .coordinates
            .iter()
            .map(|coord| projector.to_projected(*coord).map(Coord::from))
            .collect::<Result<LineString<f64>, Error>>()?;

        Ok(Self {
            projector: *projector,
            line,
            width_m,
        })
    }

    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// Projected polyline the corridor is built around.
    pub fn centerline(&self) -> &LineString<f64> {
        &self.line
    }

    /// Metric distance from `coord` to the route, `None` for an empty route.
    pub fn distance_m(&self, coord: GeoCoordinate) -> Result<Option<f64>, Error> {
        let projected = self.projector.to_projected(coord)?;
        let distance = match self.line.0.as_slice() {
            [] => None,
            [only] => Some(projected.distance_to(&ProjectedCoordinate::new(only.x, only.y))),
            _ => Some(Euclidean.distance(&Point::from(Coord::from(projected)), &self.line)),
        };
        Ok(distance)
    }

    pub fn contains(&self, coord: GeoCoordinate) -> Result<bool, Error> {
        Ok(self
            .distance_m(coord)?
            .is_some_and(|distance| distance <= self.width_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Hemisphere;

    fn projector() -> UtmProjector {
        UtmProjector::new(30, Hemisphere::North).unwrap()
    }

    fn straight_route() -> RoutePath {
        RoutePath::new(vec![
            GeoCoordinate::new(-3.7145, 40.4331),
            GeoCoordinate::new(-3.7094, 40.4356),
        ])
    }

    #[test]
    fn midpoint_of_route_is_inside() {
        let corridor = RouteCorridor::around(&projector(), &straight_route(), 100.0).unwrap();
        let midpoint = GeoCoordinate::new((-3.7145 + -3.7094) / 2.0, (40.4331 + 40.4356) / 2.0);
        assert!(corridor.contains(midpoint).unwrap());
        assert!(corridor.distance_m(midpoint).unwrap().unwrap() < 1.0);
    }

    #[test]
    fn far_point_is_outside() {
        let corridor = RouteCorridor::around(&projector(), &straight_route(), 100.0).unwrap();
        // ~1.1 km north of the route
        let far = GeoCoordinate::new(-3.7120, 40.4443);
        assert!(!corridor.contains(far).unwrap());
    }

    #[test]
    fn width_is_measured_in_meters() {
        let projector = projector();
        let route = straight_route();
        let start = projector.to_projected(route.coordinates[0]).unwrap();
        // 150 m due south of the start; the route heads north-east, so the start is nearest
        let probe = projector
            .to_geographic(ProjectedCoordinate::new(
                start.easting,
                start.northing - 150.0,
            ))
            .unwrap();

        let narrow = RouteCorridor::around(&projector, &route, 100.0).unwrap();
        let wide = RouteCorridor::around(&projector, &route, 200.0).unwrap();
        assert!(!narrow.contains(probe).unwrap());
        assert!(wide.contains(probe).unwrap());
    }

    #[test]
    fn single_point_route_is_a_disk() {
        let origin = GeoCoordinate::new(-3.7145, 40.4331);
        let corridor =
            RouteCorridor::around(&projector(), &RoutePath::new(vec![origin]), 50.0).unwrap();
        assert!(corridor.contains(origin).unwrap());
        assert!(!corridor.contains(GeoCoordinate::new(-3.7094, 40.4356)).unwrap());
    }

    #[test]
    fn empty_route_contains_nothing() {
        let corridor = RouteCorridor::around(&projector(), &RoutePath::default(), 50.0).unwrap();
        assert!(!corridor.contains(GeoCoordinate::new(-3.7145, 40.4331)).unwrap());
    }

    #[test]
    fn rejects_negative_width() {
        let err = RouteCorridor::around(&projector(), &straight_route(), -1.0).unwrap_err();
        assert_eq!(err.kind(), "invalid_radius");
    }
}
