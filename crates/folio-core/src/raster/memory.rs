//! In-memory rasterizer.

use super::{BoxFuture, PageSize, RasterError, RasterHandle, RasterResult, Rasterizer, RenderTarget, TextRun};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Rasterizer backed by a list of page sizes, for testing and headless use.
///
/// Rendering produces no pixels; it hands out fresh handles and records
/// every request. Individual pages can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryRasterizer {
    /// Page sizes at scale 1.0, index 0 = page 1.
    sizes: Vec<PageSize>,
    text: HashMap<u32, Vec<TextRun>>,
    failing: RefCell<HashSet<u32>>,
    missing_sizes: RefCell<HashSet<u32>>,
    next_handle: Cell<u64>,
    renders: RefCell<Vec<RenderTarget>>,
}

impl MemoryRasterizer {
    /// Create a rasterizer with the given unscaled page sizes.
    pub fn new(sizes: Vec<PageSize>) -> Self {
        Self {
            sizes,
            ..Self::default()
        }
    }

    /// Create a document of `count` identical pages.
    pub fn uniform(count: u32, size: PageSize) -> Self {
        Self::new(vec![size; count as usize])
    }

    /// Attach text runs to a page.
    pub fn with_text(mut self, page: u32, runs: Vec<TextRun>) -> Self {
        self.text.insert(page, runs);
        self
    }

    /// Make rendering `page` fail until [`Self::heal`] is called.
    pub fn fail_page(&self, page: u32) {
        self.failing.borrow_mut().insert(page);
    }

    /// Let a previously failing page render again.
    pub fn heal(&self, page: u32) {
        self.failing.borrow_mut().remove(&page);
    }

    /// Make the size of `page` unavailable.
    pub fn hide_size(&self, page: u32) {
        self.missing_sizes.borrow_mut().insert(page);
    }

    /// Every render request received so far, oldest first.
    pub fn renders(&self) -> Vec<RenderTarget> {
        self.renders.borrow().clone()
    }

    /// Number of render requests received for `page`.
    pub fn render_count(&self, page: u32) -> usize {
        self.renders.borrow().iter().filter(|t| t.page == page).count()
    }

    fn check_page(&self, page: u32) -> RasterResult<()> {
        if page == 0 || page as usize > self.sizes.len() {
            return Err(RasterError::PageOutOfRange(page));
        }
        Ok(())
    }
}

impl Rasterizer for MemoryRasterizer {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page: u32, scale: f64) -> BoxFuture<'_, RasterResult<PageSize>> {
        Box::pin(async move {
            self.check_page(page)?;
            if self.missing_sizes.borrow().contains(&page) {
                return Err(RasterError::SizeUnavailable(page));
            }
            Ok(self.sizes[page as usize - 1].scaled(scale))
        })
    }

    fn render_page(&self, target: RenderTarget) -> BoxFuture<'_, RasterResult<RasterHandle>> {
        Box::pin(async move {
            self.check_page(target.page)?;
            self.renders.borrow_mut().push(target);
            if self.failing.borrow().contains(&target.page) {
                return Err(RasterError::Render {
                    page: target.page,
                    reason: "simulated failure".to_string(),
                });
            }
            let id = self.next_handle.get() + 1;
            self.next_handle.set(id);
            Ok(RasterHandle(id))
        })
    }

    fn text_runs(&self, page: u32) -> BoxFuture<'_, RasterResult<Vec<TextRun>>> {
        Box::pin(async move {
            self.check_page(page)?;
            Ok(self.text.get(&page).cloned().unwrap_or_default())
        })
    }
}
