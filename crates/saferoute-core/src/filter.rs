//! Narrow the hazard catalog down to the sites near a route.

use crate::buffer::build_buffer_polygon;
use crate::corridor::RouteCorridor;
use crate::error::Error;
use crate::models::{BufferPolygon, HazardSite};
use crate::projection::UtmProjector;

/// Hazards whose location lies inside `corridor`, in catalog order.
///
/// A hazard the corridor's UTM zone cannot project lies far outside any
/// route that zone can carry, so it is skipped rather than failing the run.
pub fn filter_relevant_hazards(
    corridor: &RouteCorridor,
    hazards: &[HazardSite],
) -> Result<Vec<HazardSite>, Error> {
    let mut relevant = Vec::new();
    for hazard in hazards {
        match corridor.contains(hazard.location) {
            Ok(true) => relevant.push(*hazard),
            Ok(false) => {}
            Err(Error::Projection(reason)) => {
                tracing::trace!(location = %hazard.location, %reason, "hazard outside projection zone");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(relevant)
}

/// One avoidance ring per hazard, sized by the hazard's own radius.
pub fn build_avoidance_polygons(
    projector: &UtmProjector,
    hazards: &[HazardSite],
    segments: usize,
) -> Result<Vec<BufferPolygon>, Error> {
    hazards
        .iter()
        .map(|hazard| build_buffer_polygon(projector, hazard.location, hazard.radius_m, segments))
        .collect()
}
