//! Detour route computation.
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! RECEIVED -> NORMAL_ROUTED -> CORRIDOR_BUILT -> HAZARDS_FILTERED
//!          -> DETOUR_ROUTED -> NORMALIZED -> DONE
//! ```
//!
//! Any stage may fail; the failure carries the stage it happened in and no
//! partial result is returned.

use crate::backoff::Backoff;
use crate::catalog::{CatalogColumns, HazardCatalog};
use crate::config::PipelineConfig;
use crate::corridor::RouteCorridor;
use crate::error::{Error, PipelineFailure};
use crate::filter::{build_avoidance_polygons, filter_relevant_hazards};
use crate::models::{BufferPolygon, GeoCoordinate, HazardSite, RoutePath, RouteResult};
use crate::projection::UtmProjector;
use crate::route_client::{RawRoute, RouteClient, RouteRequest};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    NormalRouted,
    CorridorBuilt,
    HazardsFiltered,
    DetourRouted,
    Normalized,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::NormalRouted => "normal_routed",
            PipelineStage::CorridorBuilt => "corridor_built",
            PipelineStage::HazardsFiltered => "hazards_filtered",
            PipelineStage::DetourRouted => "detour_routed",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a successful run produced, for callers that want more than the
/// final feature.
#[derive(Debug, Clone)]
pub struct DetourOutcome {
    /// Unconstrained route, endpoints forced
    pub baseline: RoutePath,
    pub relevant_hazards: Vec<HazardSite>,
    pub avoid_polygons: Vec<BufferPolygon>,
    /// Final route, endpoints forced
    pub detour: RoutePath,
    pub result: RouteResult,
}

/// Turns an origin/destination pair into a route that steers clear of the
/// hazards near the direct path.
pub struct DetourPipeline {
    config: PipelineConfig,
    projector: UtmProjector,
    client: Arc<dyn RouteClient>,
    catalog: HazardCatalog,
}

impl DetourPipeline {
    pub fn new(
        config: PipelineConfig,
        client: Arc<dyn RouteClient>,
        catalog: HazardCatalog,
    ) -> Result<Self, Error> {
        let projector = UtmProjector::new(config.utm_zone, config.hemisphere)?;
        if !config.corridor_width_m.is_finite() || config.corridor_width_m < 0.0 {
            return Err(Error::InvalidRadius(config.corridor_width_m));
        }
        Ok(Self {
            config,
            projector,
            client,
            catalog,
        })
    }

    /// Build a pipeline backed by a CSV catalog; fails if the catalog does
    /// not load.
    pub fn from_catalog_file(
        config: PipelineConfig,
        client: Arc<dyn RouteClient>,
        path: impl Into<PathBuf>,
        columns: CatalogColumns,
    ) -> Result<Self, Error> {
        let catalog = HazardCatalog::open(path, columns)?;
        Self::new(config, client, catalog)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &HazardCatalog {
        &self.catalog
    }

    pub async fn run(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<RouteResult, PipelineFailure> {
        self.run_detailed(origin, destination)
            .await
            .map(|outcome| outcome.result)
    }

    pub async fn run_detailed(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<DetourOutcome, PipelineFailure> {
        use PipelineStage::*;

        origin.validate().map_err(at(Received))?;
        destination.validate().map_err(at(Received))?;
        tracing::debug!(%origin, %destination, "detour request received");

        let base_request = RouteRequest {
            origin,
            destination,
            profile: self.config.profile,
            preference: self.config.preference,
            avoid: Vec::new(),
        };

        let baseline = self
            .directions_with_retry(&base_request, NormalRouted)
            .await
            .and_then(|raw| raw.to_path())
            .map_err(at(NormalRouted))?
            .with_endpoints(origin, destination);
        tracing::debug!(points = baseline.len(), "baseline route computed");

        let corridor =
            RouteCorridor::around(&self.projector, &baseline, self.config.corridor_width_m)
                .map_err(at(CorridorBuilt))?;
        tracing::debug!(width_m = corridor.width_m(), "corridor built");

        let hazards = self.catalog.snapshot().map_err(at(HazardsFiltered))?;
        let relevant_hazards =
            filter_relevant_hazards(&corridor, &hazards).map_err(at(HazardsFiltered))?;
        let avoid_polygons = build_avoidance_polygons(
            &self.projector,
            &relevant_hazards,
            self.config.effective_segments(),
        )
        .map_err(at(HazardsFiltered))?;
        tracing::debug!(
            catalog = hazards.len(),
            relevant = relevant_hazards.len(),
            "hazards filtered"
        );

        let detour_request = base_request.avoiding(avoid_polygons.clone());
        let raw_detour = self
            .directions_with_retry(&detour_request, DetourRouted)
            .await
            .map_err(at(DetourRouted))?;
        tracing::debug!(points = raw_detour.coordinates.len(), "detour route computed");

        let detour = raw_detour
            .to_path()
            .map_err(at(Normalized))?
            .with_endpoints(origin, destination);

        let result = detour.clone().into_result();
        tracing::info!(
            %origin,
            %destination,
            avoided = relevant_hazards.len(),
            points = detour.len(),
            "detour route done"
        );

        Ok(DetourOutcome {
            baseline,
            relevant_hazards,
            avoid_polygons,
            detour,
            result,
        })
    }

    /// Call the directions service, retrying only transient failures of this
    /// one call.
    async fn directions_with_retry(
        &self,
        request: &RouteRequest,
        stage: PipelineStage,
    ) -> Result<RawRoute, Error> {
        let policy = &self.config.retry;
        let mut backoff = Backoff::from_policy(policy);
        let mut attempt = 1;
        loop {
            match self.client.directions(request).await {
                Ok(route) => return Ok(route),
                Err(err) if err.is_transient() && attempt < policy.attempts() => {
                    let delay = backoff.fail();
                    tracing::warn!(
                        %stage,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "routing call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(%stage, attempt, error = %err, "routing call failed");
                    return Err(err);
                }
            }
        }
    }
}

fn at(stage: PipelineStage) -> impl Fn(Error) -> PipelineFailure {
    move |error| PipelineFailure::new(stage, error)
}
