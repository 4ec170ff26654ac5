//! Resize and drag of committed shapes.
//!
//! All math happens in page-relative screen pixels against the geometry the
//! shape had when the pointer went down; each pointer move recomputes the
//! result from that original plus the total delta, so errors never
//! accumulate over a drag.

use crate::handles::HandleKind;
use crate::shapes::{ScreenEllipse, ScreenGeometry, ScreenLine, ScreenRect, ShapeId};
use kurbo::{Point, Rect, Size, Vec2};

/// An active manipulation of one shape.
#[derive(Debug, Clone)]
pub struct ManipulationState {
    /// The shape being manipulated.
    pub shape_id: ShapeId,
    /// The handle being dragged (None = moving the whole shape).
    pub handle: Option<HandleKind>,
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Screen geometry when the drag started.
    pub original: ScreenGeometry,
}

impl ManipulationState {
    pub fn new(
        shape_id: ShapeId,
        handle: Option<HandleKind>,
        start_point: Point,
        original: ScreenGeometry,
    ) -> Self {
        Self {
            shape_id,
            handle,
            start_point,
            current_point: start_point,
            original,
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Whether the pointer has moved since the drag started.
    pub fn has_moved(&self) -> bool {
        self.delta().hypot2() > 0.0
    }

    /// Geometry for the current pointer position.
    pub fn apply(&self, surface: Size, min_size: f64) -> ScreenGeometry {
        match self.handle {
            None => apply_drag(&self.original, self.delta(), surface),
            Some(handle) => apply_resize(&self.original, handle, self.delta(), surface, min_size),
        }
    }
}

/// Clamp a point into the drawing surface.
pub fn clamp_to_surface(point: Point, surface: Size) -> Point {
    Point::new(
        point.x.clamp(0.0, surface.width.max(0.0)),
        point.y.clamp(0.0, surface.height.max(0.0)),
    )
}

/// Translate a shape, keeping it inside the surface.
///
/// Rectangles and ellipses keep their padded frame inside; lines keep both
/// endpoints inside. The shape is never deformed.
pub fn apply_drag(original: &ScreenGeometry, delta: Vec2, surface: Size) -> ScreenGeometry {
    let extent = match original {
        ScreenGeometry::Line(line) => Rect::from_points(line.start, line.end),
        _ => original.frame(),
    };
    let dx = clamp_delta(delta.x, -extent.x0, surface.width - extent.x1);
    let dy = clamp_delta(delta.y, -extent.y0, surface.height - extent.y1);
    original.translate(Vec2::new(dx, dy))
}

/// Clamp a delta to `[lo, hi]` without ever reversing it: a shape already
/// past an edge may stay there, and a drag toward that edge is dropped.
fn clamp_delta(value: f64, lo: f64, hi: f64) -> f64 {
    if value < 0.0 {
        value.max(lo.min(0.0))
    } else {
        value.min(hi.max(0.0))
    }
}

/// Resize a shape by dragging one handle.
pub fn apply_resize(
    original: &ScreenGeometry,
    handle: HandleKind,
    delta: Vec2,
    surface: Size,
    min_size: f64,
) -> ScreenGeometry {
    match original {
        ScreenGeometry::Rectangle(rect) => {
            let frame = resize_frame(rect.frame, handle, delta, surface, min_size);
            ScreenGeometry::Rectangle(ScreenRect::from_frame(frame, rect.padding))
        }
        ScreenGeometry::Ellipse(ellipse) => {
            let frame = resize_frame(ellipse.frame(), handle, delta, surface, min_size);
            ScreenGeometry::Ellipse(ScreenEllipse::from_frame(frame, ellipse.padding))
        }
        ScreenGeometry::Line(line) => {
            ScreenGeometry::Line(resize_line(line, handle, delta, surface))
        }
    }
}

/// Move the edges a handle controls.
///
/// The dragged edge stops `min_size` away from the anchored edge, which
/// never moves, and never leaves the surface.
pub fn resize_frame(frame: Rect, handle: HandleKind, delta: Vec2, surface: Size, min_size: f64) -> Rect {
    let Rect { x0, y0, x1, y1 } = frame;
    let mut out = frame;
    if handle.moves_left() {
        out.x0 = (x0 + delta.x).min(x1 - min_size).max(0.0);
    }
    if handle.moves_right() {
        out.x1 = (x1 + delta.x).max(x0 + min_size).min(surface.width);
    }
    if handle.moves_top() {
        out.y0 = (y0 + delta.y).min(y1 - min_size).max(0.0);
    }
    if handle.moves_bottom() {
        out.y1 = (y1 + delta.y).max(y0 + min_size).min(surface.height);
    }
    debug_assert!(out.x0 <= out.x1 + f64::EPSILON && out.y0 <= out.y1 + f64::EPSILON);
    out
}

/// Move one endpoint of a line, clamped to the surface.
pub fn resize_line(line: &ScreenLine, handle: HandleKind, delta: Vec2, surface: Size) -> ScreenLine {
    match handle {
        HandleKind::Start => ScreenLine::new(
            clamp_to_surface(line.start + delta, surface),
            line.end,
            line.padding,
        ),
        HandleKind::End => ScreenLine::new(
            line.start,
            clamp_to_surface(line.end + delta, surface),
            line.padding,
        ),
        // Box handles do not apply to lines
        _ => *line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Geometry, Line, Rectangle, ShapeKind};
    use uuid::Uuid;

    const SURFACE: Size = Size::new(500.0, 400.0);

    fn rect_screen(x0: f64, y0: f64, x1: f64, y1: f64) -> ScreenGeometry {
        ScreenGeometry::Rectangle(ScreenRect::from_frame(Rect::new(x0, y0, x1, y1), 0.0))
    }

    #[test]
    fn test_corner_resize_grows() {
        let original = rect_screen(100.0, 100.0, 200.0, 200.0);
        let out = apply_resize(
            &original,
            HandleKind::BottomRight,
            Vec2::new(50.0, 30.0),
            SURFACE,
            20.0,
        );
        assert_eq!(out.frame(), Rect::new(100.0, 100.0, 250.0, 230.0));
    }

    #[test]
    fn test_corner_resize_pins_minimum_and_keeps_opposite_edge() {
        let original = rect_screen(100.0, 100.0, 200.0, 200.0);
        // Drag the top-left corner far past the bottom-right corner.
        let out = apply_resize(
            &original,
            HandleKind::TopLeft,
            Vec2::new(150.0, 95.0),
            SURFACE,
            20.0,
        );
        let frame = out.frame();
        assert!((frame.width() - 20.0).abs() < f64::EPSILON);
        assert!((frame.height() - 20.0).abs() < f64::EPSILON);
        // Anchored edges stay put.
        assert!((frame.x1 - 200.0).abs() < f64::EPSILON);
        assert!((frame.y1 - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_right_edge_pins_minimum() {
        let original = rect_screen(100.0, 100.0, 200.0, 200.0);
        let out = apply_resize(&original, HandleKind::Right, Vec2::new(-95.0, 40.0), SURFACE, 20.0);
        assert_eq!(out.frame(), Rect::new(100.0, 100.0, 120.0, 200.0));
    }

    #[test]
    fn test_edge_handle_moves_one_edge() {
        let original = rect_screen(100.0, 100.0, 200.0, 200.0);
        let out = apply_resize(&original, HandleKind::Top, Vec2::new(30.0, -40.0), SURFACE, 20.0);
        assert_eq!(out.frame(), Rect::new(100.0, 60.0, 200.0, 200.0));
    }

    #[test]
    fn test_resize_clamps_to_surface() {
        let original = rect_screen(100.0, 100.0, 200.0, 200.0);
        let out = apply_resize(
            &original,
            HandleKind::BottomRight,
            Vec2::new(1000.0, 1000.0),
            SURFACE,
            20.0,
        );
        assert_eq!(out.frame(), Rect::new(100.0, 100.0, 500.0, 400.0));

        let out = apply_resize(
            &original,
            HandleKind::TopLeft,
            Vec2::new(-1000.0, -1000.0),
            SURFACE,
            20.0,
        );
        assert_eq!(out.frame(), Rect::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_ellipse_resize_keeps_padding() {
        let original = Geometry::Ellipse(crate::shapes::Ellipse::new(100.0, 100.0, 40.0, 20.0))
            .to_screen(1.0, 4.0);
        let out = apply_resize(&original, HandleKind::Right, Vec2::new(10.0, 0.0), SURFACE, 20.0);
        match out {
            ScreenGeometry::Ellipse(e) => {
                assert!((e.radius_x - 45.0).abs() < 1e-9);
                assert!((e.radius_y - 20.0).abs() < 1e-9);
                assert!((e.center.x - 105.0).abs() < 1e-9);
                assert!((e.padding - 2.0).abs() < f64::EPSILON);
            }
            _ => panic!("Expected Ellipse geometry"),
        }
    }

    #[test]
    fn test_line_endpoint_resize_clamps_independently() {
        let original = Geometry::Line(Line::new(100.0, 100.0, 200.0, 150.0)).to_screen(1.0, 2.0);
        let out = apply_resize(&original, HandleKind::End, Vec2::new(400.0, -200.0), SURFACE, 20.0);
        match out {
            ScreenGeometry::Line(l) => {
                assert_eq!(l.start, Point::new(100.0, 100.0));
                assert_eq!(l.end, Point::new(500.0, 0.0));
                assert_eq!(l.frame(), Rect::new(99.0, -1.0, 501.0, 101.0));
            }
            _ => panic!("Expected Line geometry"),
        }
    }

    #[test]
    fn test_drag_clamps_frame_to_surface() {
        let original = Geometry::Rectangle(Rectangle::new(100.0, 100.0, 100.0, 50.0)).to_screen(1.0, 4.0);
        let out = apply_drag(&original, Vec2::new(1000.0, -1000.0), SURFACE);
        let frame = out.frame();
        assert!((frame.x1 - 500.0).abs() < 1e-9);
        assert!(frame.y0.abs() < 1e-9);
        assert!((frame.width() - original.frame().width()).abs() < 1e-9);
    }

    #[test]
    fn test_drag_never_reverses_when_frame_overhangs() {
        // Stroke 2 at the left edge: padded frame starts at x = -1.
        let original = Geometry::Rectangle(Rectangle::new(0.0, 100.0, 100.0, 60.0)).to_screen(1.0, 2.0);
        assert!((original.frame().x0 + 1.0).abs() < 1e-9);

        let out = apply_drag(&original, Vec2::new(-20.0, 0.0), SURFACE);
        assert_eq!(out, original);

        let out = apply_drag(&original, Vec2::new(-20.0, 15.0), SURFACE);
        assert!((out.frame().x0 - original.frame().x0).abs() < 1e-9);
        assert!((out.frame().y0 - original.frame().y0 - 15.0).abs() < 1e-9);

        let out = apply_drag(&original, Vec2::new(10.0, 0.0), SURFACE);
        assert!((out.frame().x0 - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_line_clamps_per_endpoint() {
        let original = ScreenGeometry::from_drag(
            ShapeKind::Line,
            Point::new(50.0, 300.0),
            Point::new(150.0, 350.0),
            2.0,
        );
        let out = apply_drag(&original, Vec2::new(-80.0, 100.0), SURFACE);
        match out {
            ScreenGeometry::Line(l) => {
                assert_eq!(l.start, Point::new(0.0, 350.0));
                assert_eq!(l.end, Point::new(100.0, 400.0));
            }
            _ => panic!("Expected Line geometry"),
        }
    }

    #[test]
    fn test_manipulation_state_recomputes_from_original() {
        let original = rect_screen(100.0, 100.0, 200.0, 200.0);
        let mut state = ManipulationState::new(
            Uuid::new_v4(),
            Some(HandleKind::Right),
            Point::new(200.0, 150.0),
            original,
        );
        assert!(!state.has_moved());
        state.current_point = Point::new(260.0, 150.0);
        assert_eq!(state.apply(SURFACE, 20.0).frame(), Rect::new(100.0, 100.0, 260.0, 200.0));
        state.current_point = Point::new(230.0, 150.0);
        assert_eq!(state.apply(SURFACE, 20.0).frame(), Rect::new(100.0, 100.0, 230.0, 200.0));
    }
}
