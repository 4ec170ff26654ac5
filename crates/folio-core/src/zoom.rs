//! Zoom stepping and scroll anchoring.
//!
//! A zoom keeps the content under the top of the viewport in place: the
//! page at the top and the distance into it are captured before the scale
//! changes and turned back into a scroll offset afterwards.

use crate::config::ZoomConfig;
use crate::layout::PositionIndex;
use serde::Serialize;

/// Position of the viewport top relative to a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollAnchor {
    pub page: u32,
    /// Pixels from the top of `page` to the viewport top, at capture scale.
    pub offset: f64,
}

impl ScrollAnchor {
    /// Capture the anchor for `page` at `scroll_top`.
    pub fn capture(index: &PositionIndex, page: u32, scroll_top: f64) -> Option<Self> {
        let top = index.top_offset(page)?;
        Some(Self {
            page,
            offset: scroll_top - top,
        })
    }

    /// Capture the anchor for whatever page is at `scroll_top`.
    pub fn at_scroll(index: &PositionIndex, scroll_top: f64) -> Option<Self> {
        Self::capture(index, index.page_from_scroll_offset(scroll_top), scroll_top)
    }

    /// Scroll offset that puts the anchor back at the viewport top after the
    /// scale changed by `ratio`, clamped to the scrollable range.
    ///
    /// `index` is the layout at the new scale. Page gaps do not scale, so an
    /// anchor in the gap below its page keeps its distance from the page
    /// bottom.
    pub fn restore(&self, index: &PositionIndex, ratio: f64, viewport_height: f64) -> f64 {
        let Some(layout) = index.layout(self.page) else {
            return clamp_scroll(index, 0.0, viewport_height);
        };
        let old_height = layout.height / ratio;
        let offset = if self.offset > old_height {
            layout.height + (self.offset - old_height)
        } else {
            self.offset * ratio
        };
        clamp_scroll(index, layout.top_offset + offset, viewport_height)
    }
}

/// Largest scroll offset for a viewport of `viewport_height` pixels.
pub fn max_scroll(index: &PositionIndex, viewport_height: f64) -> f64 {
    (index.content_size().height - viewport_height.max(0.0)).max(0.0)
}

/// Clamp a scroll offset into `[0, max_scroll]`.
pub fn clamp_scroll(index: &PositionIndex, scroll_top: f64, viewport_height: f64) -> f64 {
    if !scroll_top.is_finite() {
        return 0.0;
    }
    scroll_top.min(max_scroll(index, viewport_height)).max(0.0)
}

/// A committed scale change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomChange {
    pub previous: f64,
    pub scale: f64,
}

impl ZoomChange {
    /// Factor that converts old screen distances to new ones.
    pub fn ratio(&self) -> f64 {
        self.scale / self.previous
    }
}

/// Current scale and the rules for changing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomCoordinator {
    config: ZoomConfig,
    scale: f64,
}

impl ZoomCoordinator {
    pub fn new(config: ZoomConfig) -> Self {
        let scale = config.default.clamp(config.min, config.max);
        Self { config, scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Clamp a requested scale into the configured bounds.
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.config.min, self.config.max)
    }

    /// Switch to `scale`. Returns `None` (and changes nothing) when the
    /// scale is unchanged or not a positive number.
    pub fn set_scale(&mut self, scale: f64) -> Option<ZoomChange> {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("Ignoring invalid scale {scale}");
            return None;
        }
        if (scale - self.scale).abs() < f64::EPSILON {
            return None;
        }
        let change = ZoomChange {
            previous: self.scale,
            scale,
        };
        self.scale = scale;
        Some(change)
    }

    /// Next scale up, or `None` at the upper bound.
    pub fn zoom_in_target(&self) -> Option<f64> {
        self.step_target(self.config.step)
    }

    /// Next scale down, or `None` at the lower bound.
    pub fn zoom_out_target(&self) -> Option<f64> {
        self.step_target(-self.config.step)
    }

    pub fn default_scale(&self) -> f64 {
        self.clamp(self.config.default)
    }

    /// Scale at which a page `base_width` wide (at scale 1.0) fills
    /// `viewport_width`.
    pub fn fit_width_target(&self, viewport_width: f64, base_width: f64) -> Option<f64> {
        if !(viewport_width > 0.0) || !(base_width > 0.0) {
            return None;
        }
        Some(self.clamp(viewport_width / base_width))
    }

    fn step_target(&self, step: f64) -> Option<f64> {
        let target = round_scale(self.clamp(self.scale + step));
        if (target - self.scale).abs() < f64::EPSILON {
            None
        } else {
            Some(target)
        }
    }
}

/// Round to two decimals so repeated steps do not drift.
fn round_scale(scale: f64) -> f64 {
    (scale * 100.0).round() / 100.0
}
