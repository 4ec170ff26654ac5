//! Rectangle shape.

use super::{effective_padding, stroke_padding};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Rectangle in logical page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::from_rect(Rect::from_points(p1, p2))
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    /// Screen geometry: every coordinate scaled, frame grown by the padding.
    pub fn to_screen(&self, scale: f64, stroke_width: f64) -> ScreenRect {
        let padding = stroke_padding(stroke_width, scale);
        let left = self.left * scale - padding;
        let top = self.top * scale - padding;
        let width = self.width * scale + 2.0 * padding;
        let height = self.height * scale + 2.0 * padding;
        ScreenRect {
            frame: Rect::new(left, top, left + width, top + height),
            padding,
        }
    }

    /// Inverse of [`Rectangle::to_screen`].
    pub fn from_screen(screen: &ScreenRect, scale: f64) -> Self {
        debug_assert!(scale > 0.0, "scale must be positive");
        let inner = screen.inner();
        Self::new(
            inner.x0 / scale,
            inner.y0 / scale,
            inner.width() / scale,
            inner.height() / scale,
        )
    }
}

/// Rectangle on screen, described by its padded frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenRect {
    /// Padded frame in page-relative pixels.
    pub frame: Rect,
    /// Space reserved for the stroke on each side.
    pub padding: f64,
}

impl ScreenRect {
    /// Wrap a frame drawn by the pointer; the frame is normalized.
    pub fn from_frame(frame: Rect, padding: f64) -> Self {
        Self {
            frame: frame.abs(),
            padding,
        }
    }

    /// The rectangle the stroke is centered on.
    pub fn inner(&self) -> Rect {
        let frame = self.frame.abs();
        let pad = effective_padding(self.padding, frame.width(), frame.height());
        frame.inflate(-pad, -pad)
    }

    pub fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        let rect = self.inner();
        let band = tolerance + self.padding;
        if filled {
            rect.inflate(band, band).contains(point)
        } else {
            // Outline only: hit on the border
            let outer = rect.inflate(band, band);
            let inner = rect.inflate(-band, -band);
            outer.contains(point) && !(inner.width() > 0.0 && inner.height() > 0.0 && inner.contains(point))
        }
    }

    pub fn to_path(&self) -> BezPath {
        self.inner().to_path(0.1)
    }
}
