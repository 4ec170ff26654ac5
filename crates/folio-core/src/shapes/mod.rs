//! Annotation shapes.
//!
//! A shape stores its geometry in logical page units, independent of zoom.
//! Screen geometry is derived on demand from the logical geometry and the
//! current scale, with half of the scaled stroke width reserved on every side
//! so strokes are never clipped by the overlay frame.

mod ellipse;
mod line;
mod rectangle;

pub use ellipse::{Ellipse, ScreenEllipse};
pub use line::{Line, ScreenLine};
pub use rectangle::{Rectangle, ScreenRect};

use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Padding reserved around a shape's frame: half the scaled stroke width.
pub fn stroke_padding(stroke_width: f64, scale: f64) -> f64 {
    (stroke_width * scale / 2.0).max(0.0)
}

/// Padding usable inside a pointer-drawn frame.
///
/// Never more than half of the frame's smaller side, so the inner size of a
/// tiny frame cannot go negative.
pub fn effective_padding(padding: f64, frame_width: f64, frame_height: f64) -> f64 {
    padding.min(frame_width.min(frame_height).max(0.0) / 2.0).max(0.0)
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn red() -> Self {
        Self::new(220, 38, 38, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke style for shape outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash pattern for a stroke of the given (screen) width. Empty = solid.
    pub fn dash_pattern(&self, width: f64) -> Vec<f64> {
        let width = width.max(1.0);
        match self {
            StrokeStyle::Solid => Vec::new(),
            StrokeStyle::Dashed => vec![width * 4.0, width * 2.0],
            StrokeStyle::Dotted => vec![width, width * 1.5],
        }
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke_color: SerializableColor,
    /// Stroke width in logical units (scaled with the shape).
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        with_opacity(self.stroke_color, self.opacity)
    }

    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| with_opacity(c, self.opacity))
    }

    /// Stroke padding at `scale`.
    pub fn padding(&self, scale: f64) -> f64 {
        stroke_padding(self.stroke_width, scale)
    }
}

fn with_opacity(color: SerializableColor, opacity: f64) -> Color {
    let alpha = (color.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::red(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::default(),
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Discriminator for the shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
}

/// Logical (scale independent) geometry of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Line(Line),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rectangle(_) => ShapeKind::Rectangle,
            Geometry::Ellipse(_) => ShapeKind::Ellipse,
            Geometry::Line(_) => ShapeKind::Line,
        }
    }

    /// Screen geometry at `scale` for a stroke of `stroke_width` logical units.
    pub fn to_screen(&self, scale: f64, stroke_width: f64) -> ScreenGeometry {
        match self {
            Geometry::Rectangle(r) => ScreenGeometry::Rectangle(r.to_screen(scale, stroke_width)),
            Geometry::Ellipse(e) => ScreenGeometry::Ellipse(e.to_screen(scale, stroke_width)),
            Geometry::Line(l) => ScreenGeometry::Line(l.to_screen(scale, stroke_width)),
        }
    }

    /// Inverse of [`Geometry::to_screen`].
    pub fn from_screen(screen: &ScreenGeometry, scale: f64) -> Self {
        match screen {
            ScreenGeometry::Rectangle(r) => Geometry::Rectangle(Rectangle::from_screen(r, scale)),
            ScreenGeometry::Ellipse(e) => Geometry::Ellipse(Ellipse::from_screen(e, scale)),
            ScreenGeometry::Line(l) => Geometry::Line(Line::from_screen(l, scale)),
        }
    }

    /// Logical bounding box, ignoring stroke width.
    pub fn bounds(&self) -> Rect {
        match self {
            Geometry::Rectangle(r) => r.as_rect(),
            Geometry::Ellipse(e) => e.bounds(),
            Geometry::Line(l) => l.bounds(),
        }
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        let b = self.bounds();
        b.x0.is_finite() && b.y0.is_finite() && b.x1.is_finite() && b.y1.is_finite()
    }
}

/// Screen geometry of a shape: logical geometry times scale, plus padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenGeometry {
    Rectangle(ScreenRect),
    Ellipse(ScreenEllipse),
    Line(ScreenLine),
}

impl ScreenGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ScreenGeometry::Rectangle(_) => ShapeKind::Rectangle,
            ScreenGeometry::Ellipse(_) => ShapeKind::Ellipse,
            ScreenGeometry::Line(_) => ShapeKind::Line,
        }
    }

    /// Build screen geometry for a shape being drawn from `anchor` to `current`.
    ///
    /// For rectangles and ellipses the two points span the padded frame; for
    /// lines they are the endpoints.
    pub fn from_drag(kind: ShapeKind, anchor: Point, current: Point, padding: f64) -> Self {
        match kind {
            ShapeKind::Rectangle => {
                ScreenGeometry::Rectangle(ScreenRect::from_frame(Rect::from_points(anchor, current), padding))
            }
            ShapeKind::Ellipse => {
                ScreenGeometry::Ellipse(ScreenEllipse::from_frame(Rect::from_points(anchor, current), padding))
            }
            ShapeKind::Line => ScreenGeometry::Line(ScreenLine::new(anchor, current, padding)),
        }
    }

    /// The padded frame the overlay reserves for this shape.
    pub fn frame(&self) -> Rect {
        match self {
            ScreenGeometry::Rectangle(r) => r.frame,
            ScreenGeometry::Ellipse(e) => e.frame(),
            ScreenGeometry::Line(l) => l.frame(),
        }
    }

    pub fn padding(&self) -> f64 {
        match self {
            ScreenGeometry::Rectangle(r) => r.padding,
            ScreenGeometry::Ellipse(e) => e.padding,
            ScreenGeometry::Line(l) => l.padding,
        }
    }

    /// Size used for the click-without-drag guard: rectangle diagonal,
    /// larger ellipse radius, or line length.
    pub fn size_metric(&self) -> f64 {
        match self {
            ScreenGeometry::Rectangle(r) => r.inner().size().to_vec2().hypot(),
            ScreenGeometry::Ellipse(e) => e.radius_x.max(e.radius_y),
            ScreenGeometry::Line(l) => l.length(),
        }
    }

    /// Move by `delta` pixels.
    pub fn translate(&self, delta: Vec2) -> Self {
        match self {
            ScreenGeometry::Rectangle(r) => ScreenGeometry::Rectangle(ScreenRect {
                frame: r.frame + delta,
                padding: r.padding,
            }),
            ScreenGeometry::Ellipse(e) => ScreenGeometry::Ellipse(ScreenEllipse {
                center: e.center + delta,
                ..*e
            }),
            ScreenGeometry::Line(l) => {
                ScreenGeometry::Line(ScreenLine::new(l.start + delta, l.end + delta, l.padding))
            }
        }
    }

    /// Hit test in screen space. Filled shapes hit anywhere inside.
    pub fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        match self {
            ScreenGeometry::Rectangle(r) => r.hit_test(point, tolerance, filled),
            ScreenGeometry::Ellipse(e) => e.hit_test(point, tolerance, filled),
            ScreenGeometry::Line(l) => l.hit_test(point, tolerance),
        }
    }

    /// Outline path of the shape itself (not the frame).
    pub fn to_path(&self) -> BezPath {
        match self {
            ScreenGeometry::Rectangle(r) => r.to_path(),
            ScreenGeometry::Ellipse(e) => e.to_path(),
            ScreenGeometry::Line(l) => l.to_path(),
        }
    }
}

/// A persisted annotation shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    /// 1-based page this shape belongs to.
    pub page_number: u32,
    pub style: ShapeStyle,
    pub geometry: Geometry,
}

impl Shape {
    /// Create a shape with a fresh id.
    pub fn new(page_number: u32, geometry: Geometry, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_number,
            style,
            geometry,
        }
    }

    /// Reconstruct a shape with a known id (from persisted data).
    pub fn with_id(id: ShapeId, page_number: u32, geometry: Geometry, style: ShapeStyle) -> Self {
        Self {
            id,
            page_number,
            style,
            geometry,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// Screen geometry at `scale`.
    pub fn to_screen(&self, scale: f64) -> ScreenGeometry {
        self.geometry.to_screen(scale, self.style.stroke_width)
    }

    /// Replace the logical geometry from screen geometry at `scale`.
    pub fn set_screen(&mut self, screen: &ScreenGeometry, scale: f64) {
        debug_assert_eq!(screen.kind(), self.kind(), "shape kind cannot change");
        if screen.kind() == self.kind() {
            self.geometry = Geometry::from_screen(screen, scale);
        }
    }

    /// Hit test a page-relative screen point at `scale`.
    pub fn hit_test(&self, point: Point, scale: f64, tolerance: f64) -> bool {
        self.to_screen(scale)
            .hit_test(point, tolerance, self.style.fill_color.is_some())
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}
