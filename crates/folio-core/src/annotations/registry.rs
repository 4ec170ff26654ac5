//! Document-level annotation store, selection and pointer routing.

use super::page::{Gesture, PageAnnotations};
use super::{validate_shape, AnnotationError, ExportedShape};
use crate::config::AnnotationConfig;
use crate::drawing::{DrawOutcome, DrawingSession};
use crate::events::{SelectionInfo, ViewerEvent};
use crate::handles::SelectionOverlay;
use crate::input::{Key, MouseButton, PointerEvent};
use crate::manipulation::ManipulationState;
use crate::shapes::{ScreenGeometry, Shape, ShapeId, ShapeKind, ShapeStyle};
use kurbo::{Point, Size};
use std::collections::{BTreeMap, HashSet};

/// Persisted shapes, registered pages and the document-wide selection.
///
/// Every state change that listeners care about is queued as a
/// [`ViewerEvent`]; the owner drains the queue with
/// [`AnnotationRegistry::take_events`] and forwards it to its event bus.
#[derive(Debug, Clone)]
pub struct AnnotationRegistry {
    config: AnnotationConfig,
    scale: f64,
    /// Persisted shapes in paint order.
    shapes: Vec<Shape>,
    pages: BTreeMap<u32, PageAnnotations>,
    selected: Option<ShapeId>,
    /// One-shot tool armed by `create_shape`.
    armed: Option<(ShapeKind, ShapeStyle)>,
    /// Page that captured the current pointer gesture.
    captured: Option<u32>,
    outgoing: Vec<ViewerEvent>,
}

impl AnnotationRegistry {
    pub fn new(config: AnnotationConfig, scale: f64) -> Self {
        Self {
            config,
            scale,
            shapes: Vec::new(),
            pages: BTreeMap::new(),
            selected: None,
            armed: None,
            captured: None,
            outgoing: Vec::new(),
        }
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Take pending events (drains the queue).
    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_events(&self) -> bool {
        !self.outgoing.is_empty()
    }

    // --- Pages ---

    /// Attach a page's drawing surface. `base_size` is the page size at
    /// scale 1.0. Registering twice only updates the size.
    pub fn register_page(&mut self, page: u32, base_size: Size) -> bool {
        if let Some(existing) = self.pages.get_mut(&page) {
            existing.set_base_size(base_size);
            return false;
        }
        self.pages.insert(page, PageAnnotations::new(page, base_size));
        true
    }

    /// Drop a page's manager. A gesture on it ends as if the scale changed;
    /// a selected shape on it is deselected. Idempotent.
    pub fn unregister_page(&mut self, page: u32) -> bool {
        if !self.pages.contains_key(&page) {
            return false;
        }
        self.end_gesture(page, false);
        self.pages.remove(&page);
        if self.selected_shape().is_some_and(|s| s.page_number == page) {
            self.clear_selection();
        }
        true
    }

    pub fn is_registered(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    pub fn registered_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn page(&self, page: u32) -> Option<&PageAnnotations> {
        self.pages.get(&page)
    }

    // --- Shapes ---

    /// Arm a one-shot tool: the next pointer-down on any registered page
    /// starts drawing a shape of `kind`.
    pub fn create_shape(&mut self, kind: ShapeKind, style: ShapeStyle) {
        log::debug!("Armed {kind:?} tool");
        self.armed = Some((kind, style));
    }

    pub fn disarm(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn armed(&self) -> Option<ShapeKind> {
        self.armed.as_ref().map(|(kind, _)| *kind)
    }

    /// Add a shape from persisted data. It is left deselected and no
    /// creation event is emitted.
    pub fn add_annotation(&mut self, shape: Shape) -> Result<ShapeId, AnnotationError> {
        validate_shape(&shape)?;
        if self.contains(shape.id()) {
            return Err(AnnotationError::DuplicateId(shape.id()));
        }
        let id = shape.id();
        self.shapes.push(shape);
        Ok(id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.iter().any(|s| s.id() == id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shapes_on_page(&self, page: u32) -> impl Iterator<Item = &Shape> + '_ {
        self.shapes.iter().filter(move |s| s.page_number == page)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Screen geometry of a shape at the current scale.
    pub fn screen_geometry(&self, id: ShapeId) -> Option<ScreenGeometry> {
        self.get(id).map(|s| s.to_screen(self.scale))
    }

    /// Change a shape's style. Emits an update only if something changed.
    pub fn update_style(&mut self, id: ShapeId, style: ShapeStyle) -> bool {
        if !style.stroke_width.is_finite() || style.stroke_width < 0.0 {
            log::warn!("Ignoring invalid stroke width {} for {id}", style.stroke_width);
            return false;
        }
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id() == id) else {
            return false;
        };
        if shape.style == style {
            return false;
        }
        shape.style = style;
        let shape = shape.clone();
        self.outgoing.push(ViewerEvent::AnnotationUpdated { shape });
        true
    }

    /// Remove a shape. Unknown ids are ignored.
    pub fn delete_annotation(&mut self, id: ShapeId) -> Option<Shape> {
        let Some(index) = self.shapes.iter().position(|s| s.id() == id) else {
            log::debug!("delete_annotation: unknown id {id}");
            return None;
        };
        // A gesture on the shape dies with it
        for page in self.pages.values_mut() {
            if matches!(&page.gesture, Gesture::Manipulating { state, .. } if state.shape_id == id) {
                page.gesture = Gesture::Idle;
                if self.captured == Some(page.page_number()) {
                    self.captured = None;
                }
            }
        }
        if self.selected == Some(id) {
            self.clear_selection();
        }
        let shape = self.shapes.remove(index);
        self.outgoing.push(ViewerEvent::AnnotationDeleted { id });
        Some(shape)
    }

    /// Remove every shape without notifying anyone.
    pub fn clear(&mut self) -> usize {
        let count = self.shapes.len();
        self.shapes.clear();
        self.selected = None;
        self.armed = None;
        self.captured = None;
        for page in self.pages.values_mut() {
            page.gesture = Gesture::Idle;
        }
        count
    }

    // --- Selection ---

    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Select a shape, deselecting any other. Unknown ids are ignored.
    pub fn select_annotation(&mut self, id: ShapeId) -> bool {
        let Some(shape) = self.get(id).cloned() else {
            log::debug!("select_annotation: unknown id {id}");
            return false;
        };
        if self.selected == Some(id) {
            return true;
        }
        if let Some(previous) = self.selected.take() {
            self.outgoing
                .push(ViewerEvent::AnnotationDeselected { id: previous });
        }
        self.selected = Some(id);
        let selection = Some(SelectionInfo {
            id,
            kind: shape.kind(),
        });
        self.outgoing.push(ViewerEvent::AnnotationSelected { shape });
        self.outgoing
            .push(ViewerEvent::SelectionChanged { selection });
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        let Some(previous) = self.selected.take() else {
            return false;
        };
        self.outgoing
            .push(ViewerEvent::AnnotationDeselected { id: previous });
        self.outgoing
            .push(ViewerEvent::SelectionChanged { selection: None });
        true
    }

    /// Resize affordances of the selected shape, if its page is mounted.
    pub fn selection_overlay(&self) -> Option<(u32, SelectionOverlay)> {
        let shape = self.selected_shape()?;
        if !self.is_registered(shape.page_number) {
            return None;
        }
        let overlay = SelectionOverlay::for_screen(&shape.to_screen(self.scale));
        Some((shape.page_number, overlay))
    }

    /// The drawing in progress, if any.
    pub fn drawing(&self) -> Option<&DrawingSession> {
        let page = self.captured?;
        match self.pages.get(&page)?.gesture() {
            Gesture::Drawing(session) => Some(session),
            _ => None,
        }
    }

    /// Shape currently being drawn, in screen pixels.
    pub fn drawing_preview(&self) -> Option<(u32, ScreenGeometry)> {
        self.drawing().map(|s| (s.page_number(), s.preview()))
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing().is_some()
    }

    // --- Scale ---

    /// Switch to a new scale.
    ///
    /// A drawing in progress is cancelled; a drag or resize in progress is
    /// committed as it stands. Logical geometry is untouched, so every
    /// screen geometry derived afterwards follows the new scale.
    pub fn set_scale(&mut self, scale: f64) {
        debug_assert!(scale > 0.0, "scale must be positive");
        if !(scale > 0.0) || scale == self.scale {
            return;
        }
        let pages: Vec<u32> = self.pages.keys().copied().collect();
        for page in pages {
            self.end_gesture(page, false);
        }
        self.scale = scale;
    }

    // --- Input ---

    /// Route a pointer event. Returns true if an annotation consumed it.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down {
                page,
                position,
                button,
            } => {
                if button != MouseButton::Left {
                    return false;
                }
                if let Some(stale) = self.captured {
                    // Lost pointer-up; settle before starting anew
                    self.end_gesture(stale, true);
                }
                self.pointer_down(page, position)
            }
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } => {
                let Some(page) = self.captured else {
                    return false;
                };
                self.pointer_move(position);
                self.end_gesture(page, true)
            }
        }
    }

    /// Handle a key press. `Delete`/`Backspace` remove the selected shape
    /// once `confirm` agrees; `Escape` cancels drawing, the armed tool or
    /// the selection, in that order.
    pub fn handle_key(&mut self, key: &Key, confirm: impl FnOnce(&Shape) -> bool) -> bool {
        match key {
            Key::Escape => {
                if let Some(page) = self.captured.filter(|_| self.is_drawing()) {
                    return self.end_gesture(page, false);
                }
                if self.disarm() {
                    return true;
                }
                self.clear_selection()
            }
            key if key.is_delete() => {
                if self.captured.is_some() {
                    return false;
                }
                let Some(shape) = self.selected_shape().cloned() else {
                    return false;
                };
                if !confirm(&shape) {
                    return false;
                }
                self.delete_annotation(shape.id()).is_some()
            }
            _ => false,
        }
    }

    fn pointer_down(&mut self, page: u32, position: Point) -> bool {
        let Some(surface) = self.pages.get(&page).map(|p| p.surface(self.scale)) else {
            log::debug!("Pointer down on unregistered page {page}");
            return false;
        };

        if let Some((kind, style)) = self.armed.take() {
            let session = DrawingSession::start(kind, page, style, position, surface, self.scale);
            self.begin_gesture(page, Gesture::Drawing(session));
            self.outgoing.push(ViewerEvent::DrawStarted { page, kind });
            return true;
        }

        // Handles of the selected shape take priority over shape bodies
        if let Some((overlay_page, overlay)) = self.selection_overlay() {
            if overlay_page == page {
                let hit = overlay.hit_test(position, self.config.handle_size, self.config.hit_tolerance);
                if let (Some(handle), Some(id)) = (hit, self.selected) {
                    return self.begin_manipulation(page, id, Some(handle), position);
                }
            }
        }

        let tolerance = self.config.hit_tolerance;
        let hit = self
            .shapes
            .iter()
            .rev()
            .find(|s| s.page_number == page && s.hit_test(position, self.scale, tolerance))
            .map(|s| s.id());
        match hit {
            Some(id) => {
                self.select_annotation(id);
                self.begin_manipulation(page, id, None, position)
            }
            None => {
                self.clear_selection();
                false
            }
        }
    }

    fn begin_manipulation(
        &mut self,
        page: u32,
        id: ShapeId,
        handle: Option<crate::handles::HandleKind>,
        position: Point,
    ) -> bool {
        let Some(shape) = self.get(id) else {
            return false;
        };
        let state = ManipulationState::new(id, handle, position, shape.to_screen(self.scale));
        let before = shape.geometry;
        self.begin_gesture(page, Gesture::Manipulating { state, before });
        true
    }

    fn begin_gesture(&mut self, page: u32, gesture: Gesture) {
        if let Some(p) = self.pages.get_mut(&page) {
            p.gesture = gesture;
            self.captured = Some(page);
        }
    }

    fn pointer_move(&mut self, position: Point) -> bool {
        let Some(page) = self.captured else {
            return false;
        };
        let scale = self.scale;
        let min_size = self.config.min_resize_size;
        let Some(entry) = self.pages.get_mut(&page) else {
            self.captured = None;
            return false;
        };
        let surface = entry.surface(scale);
        match &mut entry.gesture {
            Gesture::Drawing(session) => {
                session.update(position);
                true
            }
            Gesture::Manipulating { state, .. } => {
                state.current_point = position;
                let screen = state.apply(surface, min_size);
                if let Some(shape) = self.shapes.iter_mut().find(|s| s.id() == state.shape_id) {
                    shape.set_screen(&screen, scale);
                }
                true
            }
            Gesture::Idle => false,
        }
    }

    /// Finish whatever gesture `page` has in flight.
    ///
    /// Manipulations are always committed. Drawings are committed when
    /// `commit_drawing` is set and cancelled otherwise.
    fn end_gesture(&mut self, page: u32, commit_drawing: bool) -> bool {
        let Some(entry) = self.pages.get_mut(&page) else {
            return false;
        };
        let gesture = std::mem::take(&mut entry.gesture);
        if self.captured == Some(page) {
            self.captured = None;
        }
        match gesture {
            Gesture::Idle => false,
            Gesture::Drawing(session) => {
                let kind = session.kind();
                let shape = if commit_drawing {
                    match session.finish(self.config.min_draw_size) {
                        DrawOutcome::Committed(shape) => Some(shape),
                        DrawOutcome::Discarded => None,
                    }
                } else {
                    log::debug!("Cancelled {kind:?} drawing on page {page}");
                    None
                };
                let id = shape.map(|shape| self.commit_drawn(shape));
                self.outgoing.push(ViewerEvent::DrawFinished {
                    page,
                    kind,
                    shape: id,
                });
                true
            }
            Gesture::Manipulating { state, before } => {
                let Some(shape) = self.shapes.iter_mut().find(|s| s.id() == state.shape_id) else {
                    return true;
                };
                if !state.has_moved() {
                    shape.geometry = before;
                }
                if shape.geometry != before {
                    let shape = shape.clone();
                    self.outgoing.push(ViewerEvent::AnnotationUpdated { shape });
                }
                true
            }
        }
    }

    fn commit_drawn(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.shapes.push(shape.clone());
        self.outgoing.push(ViewerEvent::AnnotationCreated { shape });
        self.select_annotation(id);
        id
    }

    // --- Persistence ---

    /// Every persisted shape with its screen geometry at `scale`.
    pub fn export_shapes(&self, scale: f64) -> Vec<ExportedShape> {
        self.shapes
            .iter()
            .map(|shape| ExportedShape::new(shape, scale))
            .collect()
    }

    /// Persisted shapes as JSON (logical geometry only).
    pub fn export_json(&self) -> Result<String, AnnotationError> {
        Ok(serde_json::to_string_pretty(&self.shapes)?)
    }

    /// Add shapes from JSON. Either every shape is added or none is.
    pub fn import_json(&mut self, json: &str) -> Result<usize, AnnotationError> {
        let shapes: Vec<Shape> = serde_json::from_str(json)?;
        let mut seen: HashSet<ShapeId> = self.shapes.iter().map(|s| s.id()).collect();
        for shape in &shapes {
            validate_shape(shape)?;
            if !seen.insert(shape.id()) {
                return Err(AnnotationError::DuplicateId(shape.id()));
            }
        }
        let count = shapes.len();
        self.shapes.extend(shapes);
        Ok(count)
    }
}
