//! Saferoute CLI - compute one detour route from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use saferoute_core::{
    CatalogColumns, DetourOutcome, DetourPipeline, GeoCoordinate, Hemisphere, PipelineConfig,
    PipelineFailure, RetryPolicy,
};
use saferoute_ors::client::DEFAULT_BASE_URL;
use saferoute_ors::OrsClient;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Walking route that detours around nearby hazards", long_about = None)]
pub struct Args {
    /// Start point as "lng,lat"
    #[arg(long, allow_hyphen_values = true)]
    pub origin: GeoCoordinate,

    /// End point as "lng,lat"
    #[arg(long, allow_hyphen_values = true)]
    pub destination: GeoCoordinate,

    /// Hazard catalog CSV
    #[arg(long, default_value = "points.csv")]
    pub catalog: PathBuf,

    /// Header of the radius column
    #[arg(long, default_value = "radius(meters)")]
    pub radius_column: String,

    /// OpenRouteService API key (falls back to ORS_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Directions service base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub ors_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_s: u64,

    /// Distance from the direct route within which hazards are avoided
    #[arg(long, default_value_t = 500.0)]
    pub corridor_width_m: f64,

    /// Vertices per hazard avoidance polygon
    #[arg(long, default_value_t = 16)]
    pub segments: usize,

    /// UTM zone for metric geometry
    #[arg(long, default_value_t = 30)]
    pub utm_zone: u8,

    /// UTM hemisphere (north or south)
    #[arg(long, default_value = "north")]
    pub hemisphere: Hemisphere,

    /// Total attempts per routing call
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Print the avoided hazards alongside the route
    #[arg(long)]
    pub verbose: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            corridor_width_m: self.corridor_width_m,
            buffer_segments: self.segments,
            utm_zone: self.utm_zone,
            hemisphere: self.hemisphere,
            retry: RetryPolicy {
                max_attempts: self.attempts,
                ..RetryPolicy::default()
            },
            ..PipelineConfig::default()
        }
    }

    pub fn catalog_columns(&self) -> CatalogColumns {
        CatalogColumns {
            radius: self.radius_column.clone(),
            ..CatalogColumns::default()
        }
    }

    fn api_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ORS_API_KEY").ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct VerboseReport<'a> {
    route: &'a saferoute_core::RouteResult,
    avoided: &'a [saferoute_core::HazardSite],
    baseline_points: usize,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    error: &'static str,
    class: saferoute_core::FailureClass,
    stage: saferoute_core::PipelineStage,
    message: String,
}

/// Render a successful run as JSON text.
pub fn render_outcome(outcome: &DetourOutcome, verbose: bool, pretty: bool) -> Result<String> {
    if verbose {
        let report = VerboseReport {
            route: &outcome.result,
            avoided: &outcome.relevant_hazards,
            baseline_points: outcome.baseline.len(),
        };
        to_json(&report, pretty)
    } else {
        to_json(&outcome.result, pretty)
    }
}

/// Render a failed run as the same structured JSON the server returns.
pub fn render_failure(failure: &PipelineFailure, pretty: bool) -> Result<String> {
    let report = FailureReport {
        error: failure.error.kind(),
        class: failure.error.class(),
        stage: failure.stage,
        message: failure.error.to_string(),
    };
    to_json(&report, pretty)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.context("Failed to serialize output")
}

/// Build the pipeline from CLI arguments; the catalog is loaded here.
pub fn build_pipeline(args: &Args) -> Result<DetourPipeline> {
    let client = OrsClient::new(
        args.ors_url.clone(),
        args.api_key(),
        Duration::from_secs(args.timeout_s.max(1)),
    )?;
    DetourPipeline::from_catalog_file(
        args.pipeline_config(),
        Arc::new(client),
        &args.catalog,
        args.catalog_columns(),
    )
    .with_context(|| format!("Failed to load hazard catalog {}", args.catalog.display()))
}
