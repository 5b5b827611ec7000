//! Shared application state.

use crate::config::Config;
use anyhow::{Context, Result};
use saferoute_core::DetourPipeline;
use saferoute_ors::OrsClient;
use std::sync::Arc;
use std::time::Duration;

/// Application state - the pipeline shared by every request.
pub struct AppState {
    pipeline: DetourPipeline,
}

impl AppState {
    pub fn new(pipeline: DetourPipeline) -> Self {
        Self { pipeline }
    }

    /// Build the ORS client and load the hazard catalog eagerly.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OrsClient::new(
            config.ors_url.clone(),
            config.ors_api_key.clone(),
            Duration::from_secs(config.ors_timeout_s.max(1)),
        )?;
        let pipeline = DetourPipeline::from_catalog_file(
            config.pipeline.clone(),
            Arc::new(client),
            &config.catalog_path,
            config.catalog_columns.clone(),
        )
        .with_context(|| {
            format!(
                "Failed to initialise detour pipeline from {}",
                config.catalog_path.display()
            )
        })?;
        Ok(Self::new(pipeline))
    }

    pub fn pipeline(&self) -> &DetourPipeline {
        &self.pipeline
    }
}
