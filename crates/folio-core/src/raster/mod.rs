//! Rasterizer abstraction.
//!
//! The decoder that turns a page number and a scale into pixels lives outside
//! this crate. The viewer only talks to it through [`Rasterizer`].

mod memory;

pub use memory::MemoryRasterizer;

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Rasterizer errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("Page {0} does not exist")]
    PageOutOfRange(u32),
    #[error("Page size unavailable for page {0}")]
    SizeUnavailable(u32),
    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("Failed to extract text from page {page}: {reason}")]
    Text { page: u32, reason: String },
}

/// Result type for rasterizer operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Boxed future for rasterizer calls. No `Send` bound: the viewer runs on a
/// single-threaded event loop.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Dimensions of a page at a given scale, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// This size multiplied by `scale`.
    pub fn scaled(self, scale: f64) -> Self {
        Self::new(self.width * scale, self.height * scale)
    }

    pub fn to_kurbo(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether both dimensions are finite and positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One run of text and its box in unscaled page units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bounds: Rect,
}

/// Where a page should be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub page: u32,
    pub scale: f64,
    /// Pixel size of the surface the rasterizer draws into.
    pub size: PageSize,
}

/// Opaque handle to a rendered bitmap owned by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterHandle(pub u64);

/// The external page rasterizer.
pub trait Rasterizer {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Page size at `scale`. Pages are 1-based.
    fn page_size(&self, page: u32, scale: f64) -> BoxFuture<'_, RasterResult<PageSize>>;

    /// Draw a page into `target`.
    fn render_page(&self, target: RenderTarget) -> BoxFuture<'_, RasterResult<RasterHandle>>;

    /// Text runs for the page's selectable text layer.
    fn text_runs(&self, page: u32) -> BoxFuture<'_, RasterResult<Vec<TextRun>>>;
}
