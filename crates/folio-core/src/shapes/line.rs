//! Line shape.

use super::{point_to_segment_dist, stroke_padding};
use kurbo::{BezPath, Line as KurboLine, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Straight segment in logical page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Line {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_points(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x, end.y)
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        (self.end() - self.start()).hypot()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    /// Both endpoints scale linearly from the page origin.
    pub fn to_screen(&self, scale: f64, stroke_width: f64) -> ScreenLine {
        ScreenLine::new(
            Point::new(self.x1 * scale, self.y1 * scale),
            Point::new(self.x2 * scale, self.y2 * scale),
            stroke_padding(stroke_width, scale),
        )
    }

    /// Inverse of [`Line::to_screen`].
    pub fn from_screen(screen: &ScreenLine, scale: f64) -> Self {
        debug_assert!(scale > 0.0, "scale must be positive");
        Self::new(
            screen.start.x / scale,
            screen.start.y / scale,
            screen.end.x / scale,
            screen.end.y / scale,
        )
    }
}

/// Line on screen; the frame is derived from the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenLine {
    pub start: Point,
    pub end: Point,
    pub padding: f64,
}

impl ScreenLine {
    pub fn new(start: Point, end: Point, padding: f64) -> Self {
        Self {
            start,
            end,
            padding,
        }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    /// Bounding box of both endpoints grown by the padding on every side.
    pub fn frame(&self) -> Rect {
        Rect::from_points(self.start, self.end).inflate(self.padding, self.padding)
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end) <= tolerance + self.padding
    }

    pub fn to_path(&self) -> BezPath {
        KurboLine::new(self.start, self.end).to_path(0.1)
    }
}
