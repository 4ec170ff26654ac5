//! Per-document viewer.
//!
//! [`DocumentViewer`] owns everything one open document needs: layout,
//! page window, zoom state, annotations and the event bus. Nothing is
//! global, so several documents can be open side by side.

use crate::annotations::{AnnotationError, AnnotationRegistry, ExportedShape};
use crate::config::{ConfigError, ViewerConfig};
use crate::events::{EventBus, SubscriptionId, ViewerEvent};
use crate::input::{Key, PointerEvent};
use crate::layout::{LayoutError, PositionIndex};
use crate::overlay::OverlayScene;
use crate::raster::Rasterizer;
use crate::shapes::{Shape, ShapeId, ShapeKind, ShapeStyle};
use crate::throttle::Throttle;
use crate::window::{render_ticket, MountOutcome, MountTicket, PageWindow};
use crate::zoom::{clamp_scroll, ScrollAnchor, ZoomCoordinator};
use kurbo::Size;
use std::ops::RangeInclusive;
use thiserror::Error;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Viewer errors.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),
}

/// One open document.
pub struct DocumentViewer<R: Rasterizer> {
    rasterizer: R,
    config: ViewerConfig,
    index: PositionIndex,
    window: PageWindow,
    zoom: ZoomCoordinator,
    annotations: AnnotationRegistry,
    events: EventBus,
    scroll: Throttle<f64>,
    scroll_top: f64,
    viewport: Size,
    current_page: u32,
}

impl<R: Rasterizer> std::fmt::Debug for DocumentViewer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentViewer")
            .field("pages", &self.index.page_count())
            .field("scale", &self.zoom.scale())
            .field("scroll_top", &self.scroll_top)
            .field("current_page", &self.current_page)
            .field("mounted", &self.window.pages())
            .finish()
    }
}

impl<R: Rasterizer> DocumentViewer<R> {
    /// Lay out the document and mount the pages around the top.
    pub async fn open(rasterizer: R, config: ViewerConfig, viewport: Size) -> Result<Self, ViewerError> {
        config.validate()?;
        let zoom = ZoomCoordinator::new(config.zoom.clone());
        let index = PositionIndex::compute(&rasterizer, zoom.scale(), config.page_gap).await?;
        log::info!(
            "Opened document: {} pages at scale {}",
            index.page_count(),
            zoom.scale()
        );

        let mut viewer = Self {
            window: PageWindow::new(config.buffer_radius),
            annotations: AnnotationRegistry::new(config.annotations.clone(), zoom.scale()),
            events: EventBus::new(),
            scroll: Throttle::new(config.scroll_throttle()),
            scroll_top: 0.0,
            viewport,
            current_page: 1,
            rasterizer,
            config,
            index,
            zoom,
        };
        viewer.update_window().await;
        Ok(viewer)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    pub fn window(&self) -> &PageWindow {
        &self.window
    }

    pub fn annotations(&self) -> &AnnotationRegistry {
        &self.annotations
    }

    pub fn page_count(&self) -> u32 {
        self.index.page_count()
    }

    pub fn scale(&self) -> f64 {
        self.zoom.scale()
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Pages intersecting the viewport.
    pub fn visible_pages(&self) -> RangeInclusive<u32> {
        self.index
            .pages_in_range(self.scroll_top, self.scroll_top + self.viewport.height)
    }

    // --- Events ---

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewerEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn flush_events(&mut self) {
        let events = self.annotations.take_events();
        self.events.emit_all(events);
    }

    // --- Scrolling and the page window ---

    /// Record a scroll position. The window is re-evaluated at most once per
    /// throttle interval; call [`Self::poll`] to deliver the trailing event.
    pub async fn on_scroll(&mut self, scroll_top: f64, now: Instant) {
        self.scroll_top = clamp_scroll(&self.index, scroll_top, self.viewport.height);
        if self.window.pinned().is_some() {
            return;
        }
        if self.scroll.submit(self.scroll_top, now).is_some() {
            self.update_window().await;
        }
    }

    /// Process a held-back scroll event once its interval has elapsed.
    pub async fn poll(&mut self, now: Instant) -> bool {
        if self.scroll.poll(now).is_none() {
            return false;
        }
        self.update_window().await;
        true
    }

    /// Process a held-back scroll event immediately.
    pub async fn flush_scroll(&mut self, now: Instant) -> bool {
        if self.scroll.flush(now).is_none() {
            return false;
        }
        self.update_window().await;
        true
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.scroll_top = clamp_scroll(&self.index, self.scroll_top, viewport.height);
    }

    /// Bring the window in line with the scroll position (or pinned page).
    pub async fn update_window(&mut self) {
        let target = match self.window.pinned() {
            Some(page) => page,
            None => self.index.page_from_scroll_offset(self.scroll_top),
        };
        self.set_current_page(target);

        let plan = self.window.plan(target, &self.index);
        for page in &plan.unmount {
            self.annotations.unregister_page(*page);
            self.events.emit(&ViewerEvent::PageUnmounted { page: *page });
        }
        self.render(plan.mount).await;
        self.flush_events();
    }

    async fn render(&mut self, tickets: Vec<MountTicket>) {
        for ticket in tickets {
            let result = render_ticket(&self.rasterizer, &ticket).await;
            match self.window.finish_mount(&ticket, result) {
                MountOutcome::Mounted => {
                    let scale = self.zoom.scale();
                    if let Some(layout) = self.index.layout(ticket.page) {
                        let base = Size::new(layout.width / scale, layout.height / scale);
                        if self.annotations.register_page(ticket.page, base) {
                            self.events
                                .emit(&ViewerEvent::PageMounted { page: ticket.page });
                        }
                    }
                }
                MountOutcome::Failed(reason) => {
                    self.events.emit(&ViewerEvent::PageRenderFailed {
                        page: ticket.page,
                        reason,
                    });
                }
                MountOutcome::Stale => {}
            }
        }
    }

    fn set_current_page(&mut self, page: u32) {
        if page != self.current_page {
            self.current_page = page;
            self.events.emit(&ViewerEvent::CurrentPageChanged { page });
        }
    }

    fn check_page(&self, page: u32, op: &str) -> bool {
        if self.index.contains(page) {
            true
        } else {
            log::warn!("{op}: invalid page number {page} (document has {})", self.page_count());
            false
        }
    }

    /// Jump to a scroll offset without throttling.
    pub async fn scroll_to(&mut self, scroll_top: f64) {
        self.scroll_top = clamp_scroll(&self.index, scroll_top, self.viewport.height);
        self.scroll.reset();
        if self.window.pinned().is_none() {
            self.update_window().await;
        }
    }

    /// Scroll so `page` is at the top of the viewport.
    pub async fn scroll_to_page(&mut self, page: u32) {
        if !self.check_page(page, "scroll_to_page") {
            return;
        }
        let top = self.index.top_offset(page).unwrap_or(0.0);
        self.scroll_top = clamp_scroll(&self.index, top, self.viewport.height);
        self.scroll.reset();
        self.update_window().await;
    }

    /// Show only `page`; scrolling no longer changes the window.
    pub async fn pin_page(&mut self, page: u32) {
        if !self.check_page(page, "pin_page") {
            return;
        }
        self.window.pin(page);
        self.scroll_top = clamp_scroll(
            &self.index,
            self.index.top_offset(page).unwrap_or(0.0),
            self.viewport.height,
        );
        self.update_window().await;
    }

    /// Return to scroll-driven windowing.
    pub async fn unpin(&mut self) {
        if self.window.unpin().is_some() {
            self.update_window().await;
        }
    }

    /// Re-request a page whose render failed.
    pub async fn retry_page(&mut self, page: u32) -> bool {
        let Some(ticket) = self.window.retry(page, &self.index) else {
            return false;
        };
        self.render(vec![ticket]).await;
        self.flush_events();
        self.window.is_mounted(page)
    }

    // --- Zoom ---

    /// Change the scale, keeping the content at the viewport top in place.
    ///
    /// Returns `Ok(false)` without emitting anything when the scale does not
    /// change.
    pub async fn apply_zoom(&mut self, scale: f64) -> Result<bool, ViewerError> {
        let scale = self.zoom.clamp(scale);
        // current_page lags a held-back scroll and stays put while pinned
        let anchor = ScrollAnchor::at_scroll(&self.index, self.scroll_top);
        let Some(change) = self.zoom.set_scale(scale) else {
            return Ok(false);
        };

        let index =
            match PositionIndex::compute(&self.rasterizer, change.scale, self.config.page_gap).await {
                Ok(index) => index,
                Err(err) => {
                    self.zoom.set_scale(change.previous);
                    return Err(err.into());
                }
            };
        self.index = index;
        if let Some(anchor) = anchor {
            self.scroll_top = anchor.restore(&self.index, change.ratio(), self.viewport.height);
            log::debug!(
                "Zoom {} -> {}: anchor page {} offset {:.1}, scroll_top {:.1}",
                change.previous,
                change.scale,
                anchor.page,
                anchor.offset,
                self.scroll_top
            );
        } else {
            self.scroll_top = clamp_scroll(&self.index, self.scroll_top, self.viewport.height);
        }

        let tickets = self.window.rescale(&self.index);
        self.render(tickets).await;
        self.scroll.reset();
        self.update_window().await;

        self.annotations.set_scale(change.scale);
        self.events.emit(&ViewerEvent::ScaleChanged {
            scale: change.scale,
            previous: change.previous,
        });
        self.flush_events();
        Ok(true)
    }

    pub async fn zoom_in(&mut self) -> Result<bool, ViewerError> {
        match self.zoom.zoom_in_target() {
            Some(scale) => self.apply_zoom(scale).await,
            None => Ok(false),
        }
    }

    pub async fn zoom_out(&mut self) -> Result<bool, ViewerError> {
        match self.zoom.zoom_out_target() {
            Some(scale) => self.apply_zoom(scale).await,
            None => Ok(false),
        }
    }

    pub async fn reset_zoom(&mut self) -> Result<bool, ViewerError> {
        let scale = self.zoom.default_scale();
        self.apply_zoom(scale).await
    }

    /// Zoom so the widest page fills the viewport width.
    pub async fn fit_width(&mut self) -> Result<bool, ViewerError> {
        let base_width = self.index.content_size().width / self.zoom.scale();
        match self.zoom.fit_width_target(self.viewport.width, base_width) {
            Some(scale) => self.apply_zoom(scale).await,
            None => Ok(false),
        }
    }

    // --- Annotations ---

    /// Arm a one-shot drawing tool.
    pub fn create_shape(&mut self, kind: ShapeKind, style: ShapeStyle) {
        self.annotations.create_shape(kind, style);
    }

    /// Add a shape from persisted data.
    pub fn add_annotation(&mut self, shape: Shape) -> Result<ShapeId, ViewerError> {
        if !self.check_page(shape.page_number, "add_annotation") {
            return Err(AnnotationError::InvalidPage(shape.page_number).into());
        }
        let id = self.annotations.add_annotation(shape)?;
        self.flush_events();
        Ok(id)
    }

    pub fn select_annotation(&mut self, id: ShapeId) -> bool {
        let selected = self.annotations.select_annotation(id);
        self.flush_events();
        selected
    }

    pub fn clear_selection(&mut self) -> bool {
        let cleared = self.annotations.clear_selection();
        self.flush_events();
        cleared
    }

    pub fn delete_annotation(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.annotations.delete_annotation(id);
        self.flush_events();
        shape
    }

    /// Remove every annotation silently.
    pub fn clear_annotations(&mut self) -> usize {
        self.annotations.clear()
    }

    pub fn update_style(&mut self, id: ShapeId, style: ShapeStyle) -> bool {
        let updated = self.annotations.update_style(id, style);
        self.flush_events();
        updated
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let consumed = self.annotations.handle_pointer(event);
        self.flush_events();
        consumed
    }

    pub fn handle_key(&mut self, key: &Key, confirm: impl FnOnce(&Shape) -> bool) -> bool {
        let consumed = self.annotations.handle_key(key, confirm);
        self.flush_events();
        consumed
    }

    /// Persisted shapes at the current scale.
    pub fn export_shapes(&self) -> Vec<ExportedShape> {
        self.annotations.export_shapes(self.zoom.scale())
    }

    pub fn export_json(&self) -> Result<String, ViewerError> {
        Ok(self.annotations.export_json()?)
    }

    /// Add shapes from JSON. Shapes on pages the document does not have are
    /// rejected along with the rest of the batch.
    pub fn import_json(&mut self, json: &str) -> Result<usize, ViewerError> {
        let shapes: Vec<Shape> = serde_json::from_str(json).map_err(AnnotationError::from)?;
        if let Some(bad) = shapes.iter().find(|s| !self.index.contains(s.page_number)) {
            log::warn!("import_json: invalid page number {}", bad.page_number);
            return Err(AnnotationError::InvalidPage(bad.page_number).into());
        }
        Ok(self.annotations.import_json(json)?)
    }

    /// Overlay scene of a mounted page.
    pub fn overlay(&self, page: u32) -> Option<OverlayScene> {
        OverlayScene::build(&self.annotations, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{MemoryRasterizer, PageSize};
    use crate::shapes::{Geometry, Rectangle};
    use pollster::block_on;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    const VIEWPORT: Size = Size::new(800.0, 600.0);

    fn viewer(pages: u32) -> DocumentViewer<MemoryRasterizer> {
        let raster = MemoryRasterizer::uniform(pages, PageSize::new(600.0, 800.0));
        block_on(DocumentViewer::open(raster, ViewerConfig::default(), VIEWPORT)).unwrap()
    }

    fn recorder(viewer: &mut DocumentViewer<MemoryRasterizer>) -> Rc<RefCell<Vec<ViewerEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        viewer.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    #[test]
    fn test_open_mounts_first_pages() {
        let viewer = viewer(20);
        assert_eq!(viewer.current_page(), 1);
        assert_eq!(viewer.window().pages(), vec![1, 2, 3, 4]);
        assert!(viewer.window().is_mounted(1));
        assert!(viewer.annotations().is_registered(4));
        assert!(!viewer.annotations().is_registered(5));
    }

    #[test]
    fn test_open_fails_on_missing_page_size() {
        let raster = MemoryRasterizer::uniform(5, PageSize::new(600.0, 800.0));
        raster.hide_size(3);
        let result = block_on(DocumentViewer::open(raster, ViewerConfig::default(), VIEWPORT));
        assert!(matches!(result, Err(ViewerError::Layout(_))));
    }

    #[test]
    fn test_scroll_moves_window() {
        let mut viewer = viewer(20);
        let seen = recorder(&mut viewer);
        let top = viewer.index().top_offset(10).unwrap();
        block_on(viewer.on_scroll(top + 5.0, Instant::now()));
        assert_eq!(viewer.current_page(), 10);
        assert_eq!(viewer.window().pages(), (7..=13).collect::<Vec<_>>());
        assert!(!viewer.annotations().is_registered(1));

        let events = seen.borrow();
        assert_eq!(events[0], ViewerEvent::CurrentPageChanged { page: 10 });
        assert!(events.contains(&ViewerEvent::PageUnmounted { page: 1 }));
        assert!(events.contains(&ViewerEvent::PageMounted { page: 13 }));
    }

    #[test]
    fn test_scroll_is_throttled_with_trailing_edge() {
        let mut viewer = viewer(20);
        let start = Instant::now();
        block_on(viewer.on_scroll(100.0, start));
        let far = viewer.index().top_offset(15).unwrap();
        block_on(viewer.on_scroll(far, start + Duration::from_millis(50)));
        // Held back: window still reflects the first event.
        assert_eq!(viewer.current_page(), 1);
        assert!(!block_on(viewer.poll(start + Duration::from_millis(100))));
        assert!(block_on(viewer.poll(start + Duration::from_millis(200))));
        assert_eq!(viewer.current_page(), 15);
        assert_eq!(viewer.window().pages(), (12..=18).collect::<Vec<_>>());
    }

    #[test]
    fn test_zoom_keeps_anchor() {
        let mut viewer = viewer(20);
        block_on(viewer.on_scroll(3000.0, Instant::now()));
        let page = viewer.current_page();
        let offset = viewer.scroll_top() - viewer.index().top_offset(page).unwrap();

        assert!(block_on(viewer.apply_zoom(1.5)).unwrap());
        let new_offset = viewer.scroll_top() - viewer.index().top_offset(page).unwrap();
        assert!((new_offset - offset * 1.5).abs() < 1.0);
        assert_eq!(viewer.current_page(), page);
        assert!((viewer.scale() - 1.5).abs() < f64::EPSILON);
        // Mounted slots were re-rendered at the new scale.
        for slot in viewer.window().slots() {
            assert!((slot.scale() - 1.5).abs() < f64::EPSILON);
        }
    }

    /// Page-relative logical y at the viewport top, and the page it is on.
    fn logical_top(viewer: &DocumentViewer<MemoryRasterizer>) -> (u32, f64) {
        let page = viewer.index().page_from_scroll_offset(viewer.scroll_top());
        let top = viewer.index().top_offset(page).unwrap();
        (page, (viewer.scroll_top() - top) / viewer.scale())
    }

    #[test]
    fn test_zoom_anchor_over_positions_and_scales() {
        let positions = [(1, 0.0), (2, 0.5), (3, 120.5), (7, 799.0), (10, 400.0), (15, 50.0)];
        let scales = [
            (1.0, 1.5),
            (1.5, 0.5),
            (2.0, 4.0),
            (4.0, 0.25),
            (0.75, 1.25),
            (0.5, 2.0),
        ];
        for (from, to) in scales {
            for (page, y) in positions {
                let mut viewer = viewer(20);
                block_on(viewer.apply_zoom(from)).unwrap();
                let top = viewer.index().top_offset(page).unwrap();
                block_on(viewer.scroll_to(top + y * from));
                assert_eq!(logical_top(&viewer).0, page);

                block_on(viewer.apply_zoom(to)).unwrap();
                let (after_page, after_y) = logical_top(&viewer);
                assert_eq!(after_page, page, "{from} -> {to} at page {page}");
                assert!(
                    (after_y - y).abs() * to < 1.0,
                    "{from} -> {to} at page {page}: {after_y} vs {y}"
                );
                assert_eq!(viewer.current_page(), page);
            }
        }
    }

    #[test]
    fn test_repeated_zoom_steps_return_to_anchor() {
        let mut viewer = viewer(20);
        let top = viewer.index().top_offset(8).unwrap();
        block_on(viewer.scroll_to(top + 333.0));
        for _ in 0..5 {
            block_on(viewer.zoom_in()).unwrap();
        }
        for _ in 0..7 {
            block_on(viewer.zoom_out()).unwrap();
        }
        block_on(viewer.reset_zoom()).unwrap();
        let (page, y) = logical_top(&viewer);
        assert_eq!(page, 8);
        assert!((y - 333.0).abs() < 1.0);
    }

    #[test]
    fn test_zoom_right_after_held_back_scroll() {
        let mut viewer = viewer(20);
        let start = Instant::now();
        block_on(viewer.on_scroll(100.0, start));
        let target = viewer.index().top_offset(15).unwrap() + 50.0;
        block_on(viewer.on_scroll(target, start + Duration::from_millis(50)));
        assert_eq!(viewer.current_page(), 1);

        block_on(viewer.apply_zoom(2.0)).unwrap();
        let (page, y) = logical_top(&viewer);
        assert_eq!(page, 15);
        assert!((y - 50.0).abs() * 2.0 < 1.0);
        assert_eq!(viewer.current_page(), 15);
        assert!(viewer.window().is_mounted(15));
    }

    #[test]
    fn test_zoom_while_pinned_anchors_on_scroll_offset() {
        let mut viewer = viewer(20);
        block_on(viewer.pin_page(5));
        let target = viewer.index().top_offset(12).unwrap() + 30.0;
        block_on(viewer.on_scroll(target, Instant::now()));
        block_on(viewer.apply_zoom(1.5)).unwrap();
        let (page, y) = logical_top(&viewer);
        assert_eq!(page, 12);
        assert!((y - 30.0).abs() * 1.5 < 1.0);
        assert_eq!(viewer.window().pages(), vec![5]);
    }

    #[test]
    fn test_zoom_noop_emits_nothing() {
        let mut viewer = viewer(5);
        let seen = recorder(&mut viewer);
        assert!(!block_on(viewer.apply_zoom(1.0)).unwrap());
        block_on(viewer.apply_zoom(4.0)).unwrap();
        seen.borrow_mut().clear();
        assert!(!block_on(viewer.zoom_in()).unwrap());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_zoom_rescales_annotations() {
        let mut viewer = viewer(5);
        let id = viewer
            .add_annotation(Shape::new(
                1,
                Geometry::Rectangle(Rectangle::new(10.0, 20.0, 100.0, 50.0)),
                ShapeStyle::default(),
            ))
            .unwrap();
        let seen = recorder(&mut viewer);
        block_on(viewer.zoom_in()).unwrap();
        assert!((viewer.scale() - 1.25).abs() < f64::EPSILON);
        assert!(seen.borrow().contains(&ViewerEvent::ScaleChanged {
            scale: 1.25,
            previous: 1.0
        }));

        let exported = viewer.export_shapes();
        let frame = exported[0].screen.frame();
        // pad = 2 * 1.25 / 2
        assert!((frame.x0 - (12.5 - 1.25)).abs() < 1e-9);
        assert!((frame.width() - (125.0 + 2.5)).abs() < 1e-9);
        assert_eq!(exported[0].id, id);
        assert_eq!(exported[0].geometry, Geometry::Rectangle(Rectangle::new(10.0, 20.0, 100.0, 50.0)));
    }

    #[test]
    fn test_fit_width_and_reset() {
        let mut viewer = viewer(5);
        assert!(block_on(viewer.fit_width()).unwrap());
        assert!((viewer.scale() - 800.0 / 600.0).abs() < 1e-9);
        assert!(block_on(viewer.reset_zoom()).unwrap());
        assert!((viewer.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pinned_page_ignores_scroll() {
        let mut viewer = viewer(20);
        block_on(viewer.pin_page(5));
        assert_eq!(viewer.window().pages(), vec![5]);
        assert_eq!(viewer.current_page(), 5);
        block_on(viewer.on_scroll(12_000.0, Instant::now()));
        assert_eq!(viewer.window().pages(), vec![5]);
        block_on(viewer.unpin());
        assert!(viewer.window().len() > 1);
    }

    #[test]
    fn test_invalid_page_is_noop() {
        let mut viewer = viewer(5);
        block_on(viewer.scroll_to_page(0));
        block_on(viewer.scroll_to_page(6));
        block_on(viewer.pin_page(9));
        assert_eq!(viewer.current_page(), 1);
        assert!(viewer.window().pinned().is_none());
        let shape = Shape::new(
            6,
            Geometry::Rectangle(Rectangle::new(0.0, 0.0, 10.0, 10.0)),
            ShapeStyle::default(),
        );
        assert!(viewer.add_annotation(shape).is_err());
    }

    #[test]
    fn test_render_failure_and_retry() {
        let raster = MemoryRasterizer::uniform(5, PageSize::new(600.0, 800.0));
        raster.fail_page(2);
        let mut viewer = block_on(DocumentViewer::open(raster, ViewerConfig::default(), VIEWPORT)).unwrap();
        assert!(!viewer.window().is_mounted(2));
        assert!(!viewer.annotations().is_registered(2));

        let seen = recorder(&mut viewer);
        viewer.rasterizer().heal(2);
        assert!(block_on(viewer.retry_page(2)));
        assert!(seen.borrow().contains(&ViewerEvent::PageMounted { page: 2 }));
    }

    #[test]
    fn test_drawing_through_viewer_reaches_bus() {
        let mut viewer = viewer(5);
        let seen = recorder(&mut viewer);
        viewer.create_shape(ShapeKind::Ellipse, ShapeStyle::default());
        assert!(viewer.handle_pointer(PointerEvent::down(2, 50.0, 50.0)));
        viewer.handle_pointer(PointerEvent::moved(150.0, 120.0));
        viewer.handle_pointer(PointerEvent::up(150.0, 120.0));

        assert_eq!(viewer.annotations().len(), 1);
        let created = seen
            .borrow()
            .iter()
            .filter(|e| matches!(e, ViewerEvent::AnnotationCreated { .. }))
            .count();
        assert_eq!(created, 1);

        let overlay = viewer.overlay(2).unwrap();
        assert_eq!(overlay.items.len(), 1);
        assert!(overlay.selection.is_some());

        assert!(viewer.handle_key(&Key::Delete, |_| true));
        assert!(viewer.annotations().is_empty());
    }

    #[test]
    fn test_import_rejects_unknown_pages() {
        let mut viewer = viewer(2);
        let shape = Shape::new(
            3,
            Geometry::Rectangle(Rectangle::new(0.0, 0.0, 10.0, 10.0)),
            ShapeStyle::default(),
        );
        let json = serde_json::to_string(&vec![shape]).unwrap();
        assert!(viewer.import_json(&json).is_err());
        assert!(viewer.annotations().is_empty());
    }
}
