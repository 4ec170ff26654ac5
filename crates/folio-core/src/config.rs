//! Viewer configuration.
//!
//! Every field has a default so a partial JSON document (or none at all) is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Zoom limits and stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Smallest allowed scale.
    pub min: f64,
    /// Largest allowed scale.
    pub max: f64,
    /// Increment used by zoom in / zoom out.
    pub step: f64,
    /// Scale a freshly opened document starts at.
    pub default: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.25,
            max: 4.0,
            step: 0.25,
            default: 1.0,
        }
    }
}

/// Annotation interaction thresholds, all in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Shapes smaller than this when the pointer is released are discarded.
    pub min_draw_size: f64,
    /// Per-axis minimum size enforced while resizing.
    pub min_resize_size: f64,
    /// Edge length of a resize handle.
    pub handle_size: f64,
    /// Extra distance accepted when hit testing shapes.
    pub hit_tolerance: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            min_draw_size: 5.0,
            min_resize_size: 20.0,
            handle_size: 8.0,
            hit_tolerance: 4.0,
        }
    }
}

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical gap between consecutive pages, in pixels.
    pub page_gap: f64,
    /// Pages kept mounted on each side of the current page.
    pub buffer_radius: u32,
    /// Minimum interval between two scroll-driven window evaluations.
    pub scroll_throttle_ms: u64,
    pub zoom: ZoomConfig,
    pub annotations: AnnotationConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_gap: 10.0,
            buffer_radius: 3,
            scroll_throttle_ms: 150,
            zoom: ZoomConfig::default(),
            annotations: AnnotationConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Scroll throttle interval as a [`Duration`].
    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    /// Reject values that would break layout or geometry math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !self.page_gap.is_finite() || self.page_gap < 0.0 {
            return Err(invalid("page_gap", "must be a non-negative number"));
        }
        let zoom = &self.zoom;
        if !(zoom.min > 0.0) || !zoom.min.is_finite() {
            return Err(invalid("zoom.min", "must be positive"));
        }
        if !(zoom.max >= zoom.min) || !zoom.max.is_finite() {
            return Err(invalid("zoom.max", "must be at least zoom.min"));
        }
        if !(zoom.step > 0.0) {
            return Err(invalid("zoom.step", "must be positive"));
        }
        if zoom.default < zoom.min || zoom.default > zoom.max {
            return Err(invalid(
                "zoom.default",
                format!("must lie within [{}, {}]", zoom.min, zoom.max),
            ));
        }
        let ann = &self.annotations;
        if ann.min_draw_size < 0.0 {
            return Err(invalid("annotations.min_draw_size", "must be non-negative"));
        }
        if ann.min_resize_size < 0.0 {
            return Err(invalid(
                "annotations.min_resize_size",
                "must be non-negative",
            ));
        }
        if !(ann.handle_size > 0.0) {
            return Err(invalid("annotations.handle_size", "must be positive"));
        }
        if ann.hit_tolerance < 0.0 {
            return Err(invalid("annotations.hit_tolerance", "must be non-negative"));
        }
        Ok(())
    }
}
