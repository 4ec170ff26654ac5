//! Pointer-driven creation of new shapes.

use crate::manipulation::clamp_to_surface;
use crate::shapes::{Geometry, ScreenGeometry, Shape, ShapeKind, ShapeStyle};
use kurbo::{Point, Size};

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// The shape was large enough and now lives in logical coordinates.
    Committed(Shape),
    /// The pointer barely moved; nothing is kept.
    Discarded,
}

/// A shape being drawn on one page's surface.
///
/// Points are page-relative screen pixels and are clamped to the surface as
/// they arrive.
#[derive(Debug, Clone)]
pub struct DrawingSession {
    kind: ShapeKind,
    page_number: u32,
    style: ShapeStyle,
    surface: Size,
    scale: f64,
    anchor: Point,
    current: Point,
}

impl DrawingSession {
    /// Pointer went down at `point`.
    pub fn start(
        kind: ShapeKind,
        page_number: u32,
        style: ShapeStyle,
        point: Point,
        surface: Size,
        scale: f64,
    ) -> Self {
        let anchor = clamp_to_surface(point, surface);
        Self {
            kind,
            page_number,
            style,
            surface,
            scale,
            anchor,
            current: anchor,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn current(&self) -> Point {
        self.current
    }

    /// Pointer moved.
    pub fn update(&mut self, point: Point) {
        self.current = clamp_to_surface(point, self.surface);
    }

    /// Screen geometry of the shape as currently drawn.
    pub fn preview(&self) -> ScreenGeometry {
        ScreenGeometry::from_drag(
            self.kind,
            self.anchor,
            self.current,
            self.style.padding(self.scale),
        )
    }

    /// Pointer released. Shapes whose size metric is below `min_size`
    /// pixels are discarded.
    pub fn finish(self, min_size: f64) -> DrawOutcome {
        let screen = self.preview();
        if screen.size_metric() < min_size {
            log::debug!(
                "Discarding {:?} on page {}: size {:.2} below {}",
                self.kind,
                self.page_number,
                screen.size_metric(),
                min_size
            );
            return DrawOutcome::Discarded;
        }
        let geometry = Geometry::from_screen(&screen, self.scale);
        if !geometry.is_finite() {
            return DrawOutcome::Discarded;
        }
        DrawOutcome::Committed(Shape::new(self.page_number, geometry, self.style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Line, Rectangle};

    const SURFACE: Size = Size::new(600.0, 800.0);

    fn session(kind: ShapeKind, scale: f64) -> DrawingSession {
        DrawingSession::start(
            kind,
            1,
            ShapeStyle::default(),
            Point::new(10.0, 10.0),
            SURFACE,
            scale,
        )
    }

    #[test]
    fn test_tiny_drag_is_discarded() {
        let mut s = session(ShapeKind::Rectangle, 1.0);
        s.update(Point::new(11.0, 11.0));
        assert_eq!(s.finish(5.0), DrawOutcome::Discarded);
    }

    #[test]
    fn test_click_without_move_is_discarded_for_all_kinds() {
        for kind in [ShapeKind::Rectangle, ShapeKind::Ellipse, ShapeKind::Line] {
            let s = session(kind, 1.0);
            assert_eq!(s.finish(5.0), DrawOutcome::Discarded);
        }
    }

    #[test]
    fn test_rectangle_commits_logical_geometry() {
        // Stroke 2 at scale 2 -> padding 2 on every side.
        let mut s = session(ShapeKind::Rectangle, 2.0);
        s.update(Point::new(110.0, 60.0));
        let shape = match s.finish(5.0) {
            DrawOutcome::Committed(shape) => shape,
            DrawOutcome::Discarded => panic!("Expected committed shape"),
        };
        assert_eq!(shape.page_number, 1);
        match shape.geometry {
            Geometry::Rectangle(Rectangle {
                left,
                top,
                width,
                height,
            }) => {
                assert!((left - 6.0).abs() < 1e-9);
                assert!((top - 6.0).abs() < 1e-9);
                assert!((width - 48.0).abs() < 1e-9);
                assert!((height - 23.0).abs() < 1e-9);
            }
            _ => panic!("Expected Rectangle geometry"),
        }
        // Screen frame at the drawing scale matches what the pointer spanned.
        let frame = shape.to_screen(2.0).frame();
        assert!((frame.x0 - 10.0).abs() < 1e-9);
        assert!((frame.x1 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_drag_ellipse() {
        let mut s = DrawingSession::start(
            ShapeKind::Ellipse,
            3,
            ShapeStyle::default(),
            Point::new(100.0, 100.0),
            SURFACE,
            1.0,
        );
        s.update(Point::new(40.0, 60.0));
        match s.finish(5.0) {
            DrawOutcome::Committed(shape) => match shape.geometry {
                Geometry::Ellipse(Ellipse { cx, cy, rx, ry }) => {
                    assert!((cx - 70.0).abs() < 1e-9);
                    assert!((cy - 80.0).abs() < 1e-9);
                    assert!((rx - 29.0).abs() < 1e-9);
                    assert!((ry - 19.0).abs() < 1e-9);
                }
                _ => panic!("Expected Ellipse geometry"),
            },
            DrawOutcome::Discarded => panic!("Expected committed shape"),
        }
    }

    #[test]
    fn test_pointer_clamped_to_surface() {
        let mut s = session(ShapeKind::Line, 1.0);
        s.update(Point::new(900.0, -50.0));
        assert_eq!(s.current(), Point::new(600.0, 0.0));
        match s.finish(5.0) {
            DrawOutcome::Committed(shape) => {
                assert_eq!(shape.geometry, Geometry::Line(Line::new(10.0, 10.0, 600.0, 0.0)));
            }
            DrawOutcome::Discarded => panic!("Expected committed shape"),
        }
    }
}
