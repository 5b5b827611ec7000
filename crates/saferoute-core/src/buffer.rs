//! Disk approximations around hazard sites.
//!
//! The ring is laid out in UTM meters and projected back to WGS84, so the
//! radius stays metric regardless of latitude.

use crate::config::MIN_BUFFER_SEGMENTS;
use crate::error::Error;
use crate::models::{BufferPolygon, GeoCoordinate, ProjectedCoordinate};
use crate::projection::UtmProjector;
use std::f64::consts::PI;

/// Build a closed polygon of `segments` sides around `center`.
///
/// Vertices sit on the circle of radius `radius_m / cos(π / segments)`, so the
/// polygon circumscribes the disk: every point within `radius_m` of the
/// center is inside the ring. `segments` below 4 is raised to 4.
pub fn build_buffer_polygon(
    projector: &UtmProjector,
    center: GeoCoordinate,
    radius_m: f64,
    segments: usize,
) -> Result<BufferPolygon, Error> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(Error::InvalidRadius(radius_m));
    }
    let segments = segments.max(MIN_BUFFER_SEGMENTS);
    let origin = projector.to_projected(center)?;
    let vertex_radius = radius_m / (PI / segments as f64).cos();

    let mut ring = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let vertex = ProjectedCoordinate::new(
            origin.easting + vertex_radius * angle.cos(),
            origin.northing + vertex_radius * angle.sin(),
        );
        ring.push(projector.to_geographic(vertex)?);
    }

    Ok(BufferPolygon::from_ring(ring))
}
