//! Scene description for a page's annotation overlay.
//!
//! A render adapter (canvas, SVG, GPU) walks an [`OverlayScene`] and draws
//! it; nothing here knows how pixels are produced.

use crate::annotations::AnnotationRegistry;
use crate::handles::{Handle, HandleShape, SelectionOverlay};
use crate::shapes::{ScreenGeometry, ShapeId, ShapeStyle};
use kurbo::{BezPath, Circle, Rect, Shape as KurboShape, Size, Stroke};
use peniko::Color;

/// Selection frame and handle color.
pub fn selection_color() -> Color {
    Color::from_rgba8(59, 130, 246, 255)
}

/// One stroked (and maybe filled) path.
#[derive(Debug, Clone)]
pub struct OverlayItem {
    /// `None` for the shape being drawn.
    pub shape: Option<ShapeId>,
    pub path: BezPath,
    pub stroke: Stroke,
    pub stroke_color: Color,
    pub fill: Option<Color>,
    /// Padded frame the overlay reserves for the item.
    pub frame: Rect,
}

impl OverlayItem {
    fn new(shape: Option<ShapeId>, screen: &ScreenGeometry, style: &ShapeStyle, scale: f64) -> Self {
        let width = style.stroke_width * scale;
        let dashes = style.stroke_style.dash_pattern(width);
        let mut stroke = Stroke::new(width);
        if !dashes.is_empty() {
            stroke = stroke.with_dashes(0.0, dashes);
        }
        Self {
            shape,
            path: screen.to_path(),
            stroke,
            stroke_color: style.stroke_with_opacity(),
            // Lines are never filled
            fill: match screen {
                ScreenGeometry::Line(_) => None,
                _ => style.fill_with_opacity(),
            },
            frame: screen.frame(),
        }
    }
}

/// Everything drawn on top of one page.
#[derive(Debug, Clone)]
pub struct OverlayScene {
    pub page: u32,
    /// Surface size in screen pixels.
    pub size: Size,
    /// Persisted shapes in paint order.
    pub items: Vec<OverlayItem>,
    /// Shape being drawn, painted above the others.
    pub preview: Option<OverlayItem>,
    pub selection: Option<SelectionOverlay>,
    pub handle_size: f64,
}

impl OverlayScene {
    /// Build the overlay of a registered page.
    pub fn build(registry: &AnnotationRegistry, page: u32) -> Option<Self> {
        let entry = registry.page(page)?;
        let scale = registry.scale();

        let items = registry
            .shapes_on_page(page)
            .map(|shape| OverlayItem::new(Some(shape.id()), &shape.to_screen(scale), &shape.style, scale))
            .collect();

        let preview = registry
            .drawing()
            .filter(|session| session.page_number() == page)
            .map(|session| OverlayItem::new(None, &session.preview(), session.style(), scale));

        let selection = registry
            .selection_overlay()
            .filter(|(p, _)| *p == page)
            .map(|(_, overlay)| overlay);

        Some(Self {
            page,
            size: entry.surface(scale),
            items,
            preview,
            selection,
            handle_size: registry.config().handle_size,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.preview.is_none()
    }

    /// Dashed outline of the selection frame, in the selection color.
    pub fn selection_frame_path(&self) -> Option<(BezPath, Stroke, Color)> {
        let selection = self.selection.as_ref()?;
        let stroke = Stroke::new(1.0).with_dashes(0.0, [4.0, 4.0]);
        Some((selection.frame.to_path(0.1), stroke, selection_color()))
    }

    /// Paths of the selection handles.
    pub fn handle_paths(&self) -> Vec<BezPath> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        selection
            .handles
            .iter()
            .map(|handle| handle_path(handle, self.handle_size))
            .collect()
    }
}

/// Outline of a handle at `size` pixels.
pub fn handle_path(handle: &Handle, size: f64) -> BezPath {
    match handle.shape {
        HandleShape::Square => handle.rect(size).to_path(0.1),
        HandleShape::Circle => Circle::new(handle.position, size / 2.0).to_path(0.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnotationConfig;
    use crate::input::PointerEvent;
    use crate::shapes::{Geometry, Line, Rectangle, Shape, ShapeKind, StrokeStyle};

    fn registry() -> AnnotationRegistry {
        let mut registry = AnnotationRegistry::new(AnnotationConfig::default(), 2.0);
        registry.register_page(1, Size::new(600.0, 800.0));
        registry
    }

    #[test]
    fn test_scene_scales_strokes() {
        let mut registry = registry();
        let style = ShapeStyle {
            stroke_width: 3.0,
            stroke_style: StrokeStyle::Dashed,
            ..ShapeStyle::default()
        };
        let id = registry
            .add_annotation(Shape::new(
                1,
                Geometry::Rectangle(Rectangle::new(10.0, 10.0, 50.0, 50.0)),
                style,
            ))
            .unwrap();
        let scene = OverlayScene::build(&registry, 1).unwrap();
        assert_eq!(scene.size, Size::new(1200.0, 1600.0));
        assert_eq!(scene.items.len(), 1);
        let item = &scene.items[0];
        assert_eq!(item.shape, Some(id));
        assert!((item.stroke.width - 6.0).abs() < f64::EPSILON);
        assert_eq!(item.stroke.dash_pattern.as_slice(), &[24.0, 12.0]);
        assert_eq!(item.frame, Rect::new(17.0, 17.0, 123.0, 123.0));
        assert!(scene.selection.is_none());
        assert!(scene.handle_paths().is_empty());
    }

    #[test]
    fn test_scene_shows_selection_and_preview() {
        let mut registry = registry();
        let id = registry
            .add_annotation(Shape::new(
                1,
                Geometry::Line(Line::new(10.0, 10.0, 100.0, 10.0)),
                ShapeStyle::default(),
            ))
            .unwrap();
        registry.select_annotation(id);
        registry.create_shape(ShapeKind::Ellipse, ShapeStyle::default());
        registry.handle_pointer(PointerEvent::down(1, 300.0, 300.0));
        registry.handle_pointer(PointerEvent::moved(400.0, 380.0));

        let scene = OverlayScene::build(&registry, 1).unwrap();
        assert!(scene.preview.is_some());
        assert_eq!(scene.handle_paths().len(), 2);
        assert!(scene.selection_frame_path().is_some());
        assert!(OverlayScene::build(&registry, 2).is_none());
    }
}
