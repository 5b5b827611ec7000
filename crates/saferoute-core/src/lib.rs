pub mod backoff;
pub mod buffer;
pub mod catalog;
pub mod config;
pub mod corridor;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod projection;
pub mod route_client;

pub use buffer::build_buffer_polygon;
pub use catalog::{load_hazards, load_hazards_from_path, CatalogColumns, HazardCatalog};
pub use config::{PipelineConfig, RetryPolicy};
pub use corridor::RouteCorridor;
pub use error::{Error, FailureClass, PipelineFailure};
pub use filter::{build_avoidance_polygons, filter_relevant_hazards};
pub use models::{
    BufferPolygon, GeoCoordinate, HazardSite, LineStringGeometry, ProjectedCoordinate, RoutePath,
    RouteResult,
};
pub use pipeline::{DetourOutcome, DetourPipeline, PipelineStage};
pub use projection::{Hemisphere, UtmProjector};
pub use route_client::{Preference, Profile, RawRoute, RouteClient, RouteRequest};
