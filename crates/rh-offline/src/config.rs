//! Configuration types for offline rendering

use rh_dsp::oversampling::OversampleFactor;
use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, OfflineResult};

/// Offline rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Number of worker threads for batch rendering (0 = auto)
    pub thread_count: usize,

    /// Maximum renders running at once in a batch
    pub max_parallel_jobs: usize,

    /// Oversampling used by the saturation stage
    pub saturation_oversampling: OversampleFactor,

    /// Record bypassed-stage warnings in the render report
    pub collect_warnings: bool,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            thread_count: 0, // Auto-detect
            max_parallel_jobs: 4,
            saturation_oversampling: OversampleFactor::X4,
            collect_warnings: true,
        }
    }
}

impl OfflineConfig {
    /// Create config for maximum quality (slower)
    pub fn quality() -> Self {
        Self {
            max_parallel_jobs: 2,
            saturation_oversampling: OversampleFactor::X8,
            ..Default::default()
        }
    }

    /// Create config for maximum speed
    pub fn fast() -> Self {
        Self {
            max_parallel_jobs: 8,
            saturation_oversampling: OversampleFactor::X2,
            ..Default::default()
        }
    }

    /// Set thread count
    pub fn with_threads(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Set saturation oversampling
    pub fn with_oversampling(mut self, factor: OversampleFactor) -> Self {
        self.saturation_oversampling = factor;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> OfflineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| OfflineError::InvalidInput(format!("bad config: {}", e)))
    }

    pub fn to_json(&self) -> OfflineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| OfflineError::Encoding(e.to_string()))
    }
}
