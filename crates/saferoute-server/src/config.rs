//! Server configuration from environment.

use saferoute_core::{CatalogColumns, PipelineConfig, RetryPolicy};
use saferoute_ors::client::DEFAULT_BASE_URL;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub catalog_path: PathBuf,
    pub catalog_columns: CatalogColumns,
    pub ors_url: String,
    pub ors_api_key: String,
    pub ors_timeout_s: u64,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = PipelineConfig::default();
        let retry_defaults = RetryPolicy::default();
        Self {
            server_port: parse_env("SAFEROUTE_PORT").unwrap_or(5000),
            catalog_path: env::var("SAFEROUTE_CATALOG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("points.csv")),
            catalog_columns: CatalogColumns {
                radius: env::var("SAFEROUTE_RADIUS_COLUMN")
                    .unwrap_or_else(|_| CatalogColumns::default().radius),
                ..CatalogColumns::default()
            },
            ors_url: env::var("ORS_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ors_api_key: env::var("ORS_API_KEY").unwrap_or_default(),
            ors_timeout_s: parse_env("ORS_TIMEOUT_S").unwrap_or(10),
            pipeline: PipelineConfig {
                corridor_width_m: parse_env("SAFEROUTE_CORRIDOR_WIDTH_M")
                    .unwrap_or(defaults.corridor_width_m),
                buffer_segments: parse_env("SAFEROUTE_BUFFER_SEGMENTS")
                    .unwrap_or(defaults.buffer_segments),
                utm_zone: parse_env("SAFEROUTE_UTM_ZONE").unwrap_or(defaults.utm_zone),
                hemisphere: parse_env("SAFEROUTE_UTM_HEMISPHERE").unwrap_or(defaults.hemisphere),
                retry: RetryPolicy {
                    max_attempts: parse_env("SAFEROUTE_RETRY_ATTEMPTS")
                        .unwrap_or(retry_defaults.max_attempts),
                    ..retry_defaults
                },
                ..defaults
            },
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
