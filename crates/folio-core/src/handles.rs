//! Selection overlay geometry.
//!
//! The resize overlay of a selected shape is a pure function of its screen
//! geometry: a frame plus handle positions. A rendering adapter draws it; no
//! rendering technology leaks in here.

use crate::shapes::{ScreenGeometry, ShapeKind};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// The kind of handle, which determines which edges a drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    // Corner handles
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    // Edge midpoint handles
    Top,
    Right,
    Bottom,
    Left,
    // Line endpoints
    Start,
    End,
}

impl HandleKind {
    /// Handles offered for rectangles and ellipses, in drawing order.
    pub const BOX: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::Top,
        HandleKind::TopRight,
        HandleKind::Right,
        HandleKind::BottomRight,
        HandleKind::Bottom,
        HandleKind::BottomLeft,
        HandleKind::Left,
    ];

    /// Handles offered for lines.
    pub const LINE: [HandleKind; 2] = [HandleKind::Start, HandleKind::End];

    pub fn moves_left(&self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::BottomLeft | HandleKind::Left)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, HandleKind::TopRight | HandleKind::BottomRight | HandleKind::Right)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::TopRight | HandleKind::Top)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, HandleKind::BottomLeft | HandleKind::BottomRight | HandleKind::Bottom)
    }

    /// Position of this handle on a frame.
    fn on_frame(&self, frame: Rect) -> Point {
        let center = frame.center();
        match self {
            HandleKind::TopLeft => Point::new(frame.x0, frame.y0),
            HandleKind::Top => Point::new(center.x, frame.y0),
            HandleKind::TopRight => Point::new(frame.x1, frame.y0),
            HandleKind::Right => Point::new(frame.x1, center.y),
            HandleKind::BottomRight => Point::new(frame.x1, frame.y1),
            HandleKind::Bottom => Point::new(center.x, frame.y1),
            HandleKind::BottomLeft => Point::new(frame.x0, frame.y1),
            HandleKind::Left => Point::new(frame.x0, center.y),
            HandleKind::Start | HandleKind::End => center,
        }
    }
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleShape {
    /// Square handle (default for box handles).
    #[default]
    Square,
    /// Circular handle (for line endpoints).
    Circle,
}

/// A manipulation handle on a selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    pub kind: HandleKind,
    /// Centre of the handle, page-relative pixels.
    pub position: Point,
    pub shape: HandleShape,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self {
            kind,
            position,
            shape: HandleShape::default(),
        }
    }

    /// Set the handle shape.
    pub fn with_shape(mut self, shape: HandleShape) -> Self {
        self.shape = shape;
        self
    }

    /// Square hit area of `size` pixels, plus `tolerance`.
    pub fn hit_test(&self, point: Point, size: f64, tolerance: f64) -> bool {
        let half = size / 2.0 + tolerance;
        (point.x - self.position.x).abs() <= half && (point.y - self.position.y).abs() <= half
    }

    /// Hit box of the handle.
    pub fn rect(&self, size: f64) -> Rect {
        Rect::from_center_size(self.position, (size, size))
    }
}

/// Resize affordances of a selected shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOverlay {
    /// Padded frame of the shape.
    pub frame: Rect,
    pub handles: Vec<Handle>,
}

impl SelectionOverlay {
    /// Overlay for a shape's current screen geometry.
    pub fn for_screen(screen: &ScreenGeometry) -> Self {
        let frame = screen.frame();
        let handles = handles_for(screen.kind())
            .iter()
            .map(|&kind| place_handle(kind, screen, frame))
            .collect();
        Self { frame, handles }
    }

    /// Handle under `point`, if any. Later handles win ties.
    pub fn hit_test(&self, point: Point, size: f64, tolerance: f64) -> Option<HandleKind> {
        self.handles
            .iter()
            .rev()
            .find(|h| h.hit_test(point, size, tolerance))
            .map(|h| h.kind)
    }

    pub fn handle(&self, kind: HandleKind) -> Option<&Handle> {
        self.handles.iter().find(|h| h.kind == kind)
    }
}

fn place_handle(kind: HandleKind, screen: &ScreenGeometry, frame: Rect) -> Handle {
    match (kind, screen) {
        (HandleKind::Start, ScreenGeometry::Line(line)) => {
            Handle::new(kind, line.start).with_shape(HandleShape::Circle)
        }
        (HandleKind::End, ScreenGeometry::Line(line)) => {
            Handle::new(kind, line.end).with_shape(HandleShape::Circle)
        }
        _ => Handle::new(kind, kind.on_frame(frame)),
    }
}

/// Handle kinds offered for a shape kind.
pub fn handles_for(kind: ShapeKind) -> &'static [HandleKind] {
    match kind {
        ShapeKind::Rectangle | ShapeKind::Ellipse => &HandleKind::BOX,
        ShapeKind::Line => &HandleKind::LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Geometry, Line, Rectangle};

    #[test]
    fn test_rectangle_has_eight_handles() {
        let screen = Geometry::Rectangle(Rectangle::new(0.0, 0.0, 100.0, 50.0)).to_screen(1.0, 0.0);
        let overlay = SelectionOverlay::for_screen(&screen);
        assert_eq!(overlay.handles.len(), 8);
        assert_eq!(
            overlay.handle(HandleKind::Right).unwrap().position,
            Point::new(100.0, 25.0)
        );
        assert_eq!(
            overlay.handle(HandleKind::BottomLeft).unwrap().position,
            Point::new(0.0, 50.0)
        );
    }

    #[test]
    fn test_line_has_endpoint_handles() {
        let screen = Geometry::Line(Line::new(0.0, 0.0, 100.0, 100.0)).to_screen(2.0, 2.0);
        let overlay = SelectionOverlay::for_screen(&screen);
        assert_eq!(overlay.handles.len(), 2);
        assert_eq!(overlay.handles[1].position, Point::new(200.0, 200.0));
        assert_eq!(overlay.handles[0].shape, HandleShape::Circle);
        // Frame follows the padded bounding box.
        assert_eq!(overlay.frame, Rect::new(-2.0, -2.0, 202.0, 202.0));
    }

    #[test]
    fn test_overlay_uses_padded_frame() {
        let screen = Geometry::Rectangle(Rectangle::new(10.0, 10.0, 100.0, 50.0)).to_screen(1.0, 4.0);
        let overlay = SelectionOverlay::for_screen(&screen);
        assert_eq!(
            overlay.handle(HandleKind::TopLeft).unwrap().position,
            Point::new(8.0, 8.0)
        );
    }

    #[test]
    fn test_handle_hit_test() {
        let screen = Geometry::Rectangle(Rectangle::new(0.0, 0.0, 100.0, 100.0)).to_screen(1.0, 0.0);
        let overlay = SelectionOverlay::for_screen(&screen);
        assert_eq!(
            overlay.hit_test(Point::new(101.0, 99.0), 8.0, 0.0),
            Some(HandleKind::BottomRight)
        );
        assert_eq!(overlay.hit_test(Point::new(50.0, 50.0), 8.0, 0.0), None);
    }

    #[test]
    fn test_edge_semantics() {
        assert!(HandleKind::TopLeft.moves_left() && HandleKind::TopLeft.moves_top());
        assert!(HandleKind::Right.moves_right() && !HandleKind::Right.moves_top());
        assert!(!HandleKind::Bottom.moves_left() && HandleKind::Bottom.moves_bottom());
        assert_eq!(handles_for(ShapeKind::Ellipse).len(), 8);
        assert_eq!(handles_for(ShapeKind::Line).len(), 2);
    }
}
