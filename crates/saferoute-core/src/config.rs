//! Tunables for the detour pipeline.

use crate::projection::Hemisphere;
use crate::route_client::{Preference, Profile};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest ring resolution the buffer builder accepts.
pub const MIN_BUFFER_SEGMENTS: usize = 4;

/// Configuration handed to [`crate::DetourPipeline::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Distance in meters around the baseline route within which hazards count
    pub corridor_width_m: f64,
    /// Vertex count of each hazard avoidance ring
    pub buffer_segments: usize,
    /// UTM zone used for all metric geometry
    pub utm_zone: u8,
    pub hemisphere: Hemisphere,
    pub profile: Profile,
    pub preference: Preference,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corridor_width_m: 500.0,
            buffer_segments: 16,
            utm_zone: 30, // Iberian peninsula (EPSG:32630)
            hemisphere: Hemisphere::North,
            profile: Profile::FootWalking,
            preference: Preference::Recommended,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn effective_segments(&self) -> usize {
        self.buffer_segments.max(MIN_BUFFER_SEGMENTS)
    }
}

/// Bounded retry for transient routing failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per routing call, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
