//! Expansion settings.

use crate::error::{RoiError, RoiResult};
use crate::expand::QUADRANT_SEGMENTS;
use crate::policy::PriorityChoice;
use serde::{Deserialize, Serialize};

/// Default expansion radius in pixels.
pub const DEFAULT_RADIUS: f64 = 3.0;

/// Selections larger than this trigger a "this may take a while" notice.
pub const DEFAULT_NOTIFY_THRESHOLD: usize = 500;

/// Settings for one expansion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Buffer distance in pixels. Negative values shrink.
    pub radius: f64,
    /// Segments per quarter circle at rounded corners.
    pub quadrant_segments: usize,
    /// Selection size above which the caller is told the run may be slow.
    pub notify_threshold: usize,
    /// How overlaps between different classes are settled.
    pub priority: PriorityChoice,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            quadrant_segments: QUADRANT_SEGMENTS,
            notify_threshold: DEFAULT_NOTIFY_THRESHOLD,
            priority: PriorityChoice::default(),
        }
    }
}

impl ExpansionConfig {
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_priority(mut self, priority: PriorityChoice) -> Self {
        self.priority = priority;
        self
    }

    /// Check the settings before any shape is touched.
    pub fn validate(&self) -> RoiResult<()> {
        if !self.radius.is_finite() {
            return Err(RoiError::NonFiniteRadius(self.radius));
        }
        if self.quadrant_segments == 0 {
            return Err(RoiError::InvalidConfig(
                "quadrant_segments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a selection of `count` shapes deserves a slowness notice.
    pub fn is_large_selection(&self, count: usize) -> bool {
        count > self.notify_threshold
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> RoiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RoiError::Serialization(e.to_string()))
    }

    /// Deserialize and validate a config from JSON.
    pub fn from_json(json: &str) -> RoiResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RoiError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
