//! Ellipse shape.

use super::{effective_padding, stroke_padding};
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Axis-aligned ellipse in logical page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

impl Ellipse {
    pub fn new(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self { cx, cy, rx, ry }
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center.x, center.y, radius, radius)
    }

    /// Create an ellipse inscribed in a bounding rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        let center = rect.center();
        Self::new(center.x, center.y, rect.width() / 2.0, rect.height() / 2.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.cx - self.rx,
            self.cy - self.ry,
            self.cx + self.rx,
            self.cy + self.ry,
        )
    }

    /// Centre and radii scale linearly; the padding only grows the frame.
    pub fn to_screen(&self, scale: f64, stroke_width: f64) -> ScreenEllipse {
        ScreenEllipse {
            center: Point::new(self.cx * scale, self.cy * scale),
            radius_x: self.rx * scale,
            radius_y: self.ry * scale,
            padding: stroke_padding(stroke_width, scale),
        }
    }

    /// Inverse of [`Ellipse::to_screen`].
    pub fn from_screen(screen: &ScreenEllipse, scale: f64) -> Self {
        debug_assert!(scale > 0.0, "scale must be positive");
        Self::new(
            screen.center.x / scale,
            screen.center.y / scale,
            screen.radius_x / scale,
            screen.radius_y / scale,
        )
    }
}

/// Ellipse on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenEllipse {
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    pub padding: f64,
}

impl ScreenEllipse {
    /// Ellipse inscribed in a padded frame drawn by the pointer.
    ///
    /// The padding is shrunk for frames too small to hold it, so
    /// [`ScreenEllipse::frame`] gives back `frame`.
    pub fn from_frame(frame: Rect, padding: f64) -> Self {
        let frame = frame.abs();
        let pad = effective_padding(padding, frame.width(), frame.height());
        Self {
            center: frame.center(),
            radius_x: frame.width() / 2.0 - pad,
            radius_y: frame.height() / 2.0 - pad,
            padding: pad,
        }
    }

    /// Bounding box of the radii, without padding.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    /// Radii box expanded by the padding in each direction.
    pub fn frame(&self) -> Rect {
        self.bounds().inflate(self.padding, self.padding)
    }

    pub fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        let band = tolerance + self.padding;
        let dx_outer = (point.x - self.center.x) / (self.radius_x + band);
        let dy_outer = (point.y - self.center.y) / (self.radius_y + band);
        if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
            return false;
        }
        if filled {
            return true;
        }
        // Outline only: reject if inside inner ellipse
        let inner_rx = (self.radius_x - band).max(0.0);
        let inner_ry = (self.radius_y - band).max(0.0);
        if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
            return true;
        }
        let dx_inner = (point.x - self.center.x) / inner_rx;
        let dy_inner = (point.y - self.center.y) / inner_ry;
        dx_inner * dx_inner + dy_inner * dy_inner > 1.0
    }

    pub fn to_path(&self) -> BezPath {
        KurboEllipse::new(self.center, (self.radius_x, self.radius_y), 0.0).to_path(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle() {
        let circle = Ellipse::circle(Point::new(0.0, 0.0), 10.0);
        assert!((circle.rx - circle.ry).abs() < f64::EPSILON);
    }

    #[test]
    fn test_padding_grows_frame_not_radii() {
        let ellipse = Ellipse::new(50.0, 50.0, 30.0, 20.0);
        let screen = ellipse.to_screen(2.0, 3.0);
        assert!((screen.radius_x - 60.0).abs() < f64::EPSILON);
        assert!((screen.radius_y - 40.0).abs() < f64::EPSILON);
        let frame = screen.frame();
        assert!((frame.x0 - (100.0 - 60.0 - 3.0)).abs() < f64::EPSILON);
        assert!((frame.width() - 126.0).abs() < f64::EPSILON);
        assert!((frame.height() - 86.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_frame_subtracts_padding() {
        let screen = ScreenEllipse::from_frame(Rect::new(10.0, 10.0, 110.0, 60.0), 5.0);
        assert!((screen.center.x - 60.0).abs() < f64::EPSILON);
        assert!((screen.radius_x - 45.0).abs() < f64::EPSILON);
        assert!((screen.radius_y - 20.0).abs() < f64::EPSILON);
        assert_eq!(screen.frame(), Rect::new(10.0, 10.0, 110.0, 60.0));
    }

    #[test]
    fn test_from_tiny_frame_keeps_frame() {
        let drawn = Rect::new(10.0, 10.0, 14.0, 40.0);
        let screen = ScreenEllipse::from_frame(drawn, 5.0);
        assert!((screen.padding - 2.0).abs() < f64::EPSILON);
        assert!(screen.radius_x.abs() < f64::EPSILON);
        assert!((screen.radius_y - 13.0).abs() < f64::EPSILON);
        assert_eq!(screen.frame(), drawn);
    }

    #[test]
    fn test_hit_test_center() {
        let screen = Ellipse::new(50.0, 50.0, 30.0, 20.0).to_screen(1.0, 2.0);
        assert!(screen.hit_test(Point::new(50.0, 50.0), 0.0, true));
        assert!(!screen.hit_test(Point::new(50.0, 50.0), 0.0, false));
    }

    #[test]
    fn test_hit_test_edge() {
        let screen = Ellipse::circle(Point::new(0.0, 0.0), 10.0).to_screen(1.0, 0.0);
        assert!(screen.hit_test(Point::new(10.0, 0.0), 1.0, false));
        assert!(!screen.hit_test(Point::new(15.0, 0.0), 1.0, false));
    }
}
