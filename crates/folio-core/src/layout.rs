//! Viewport position index.
//!
//! Cumulative vertical offsets of every page at one scale. Both the page
//! window and navigation read from it; it must be rebuilt whenever the scale
//! changes.

use crate::raster::{PageSize, RasterError, Rasterizer};
use kurbo::Size;
use serde::Serialize;
use thiserror::Error;

/// Layout errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Document has no pages")]
    EmptyDocument,
    #[error("Page {page} has unusable size {width}x{height}")]
    InvalidPageSize { page: u32, width: f64, height: f64 },
    #[error("Page size unavailable: {0}")]
    Raster(#[from] RasterError),
}

/// Placement of one page at the current scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: u32,
    /// Distance from the top of the scroll content to the top of the page.
    pub top_offset: f64,
    pub width: f64,
    pub height: f64,
}

impl PageLayout {
    /// Offset of the page's bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top_offset + self.height
    }

    pub fn size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }
}

/// Sorted page placements plus total content size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionIndex {
    pages: Vec<PageLayout>,
    scale: f64,
    gap: f64,
    content_width: f64,
    content_height: f64,
}

impl PositionIndex {
    /// Query the rasterizer for every page size at `scale` and lay them out.
    ///
    /// Pages are visited strictly in order; the first page whose size cannot
    /// be obtained aborts the whole computation.
    pub async fn compute<R: Rasterizer + ?Sized>(
        rasterizer: &R,
        scale: f64,
        gap: f64,
    ) -> Result<Self, LayoutError> {
        let count = rasterizer.page_count();
        let mut sizes = Vec::with_capacity(count as usize);
        for page in 1..=count {
            sizes.push(rasterizer.page_size(page, scale).await?);
        }
        Self::from_sizes(&sizes, scale, gap)
    }

    /// Lay out pages whose sizes (already at `scale`) are known.
    pub fn from_sizes(sizes: &[PageSize], scale: f64, gap: f64) -> Result<Self, LayoutError> {
        if sizes.is_empty() {
            return Err(LayoutError::EmptyDocument);
        }

        let mut pages = Vec::with_capacity(sizes.len());
        let mut offset = 0.0;
        let mut content_width: f64 = 0.0;
        for (i, size) in sizes.iter().enumerate() {
            let page_number = i as u32 + 1;
            if !size.is_usable() {
                return Err(LayoutError::InvalidPageSize {
                    page: page_number,
                    width: size.width,
                    height: size.height,
                });
            }
            pages.push(PageLayout {
                page_number,
                top_offset: offset,
                width: size.width,
                height: size.height,
            });
            content_width = content_width.max(size.width);
            offset += size.height + gap;
        }
        // The trailing gap is not part of the content.
        let content_height = offset - gap;

        Ok(Self {
            pages,
            scale,
            gap,
            content_width,
            content_height,
        })
    }

    /// Scale these offsets were computed for.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Total scrollable content size.
    pub fn content_size(&self) -> Size {
        Size::new(self.content_width, self.content_height)
    }

    /// Layout of a page, `None` for out-of-range page numbers.
    pub fn layout(&self, page: u32) -> Option<&PageLayout> {
        if page == 0 {
            return None;
        }
        self.pages.get(page as usize - 1)
    }

    /// Top offset of a page.
    pub fn top_offset(&self, page: u32) -> Option<f64> {
        self.layout(page).map(|l| l.top_offset)
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.page_count()
    }

    /// All layouts in page order.
    pub fn iter(&self) -> impl Iterator<Item = &PageLayout> {
        self.pages.iter()
    }

    /// The greatest page whose top offset is at or above `scroll_top`.
    ///
    /// Positions before the first page map to page 1 and positions past the
    /// end map to the last page.
    pub fn page_from_scroll_offset(&self, scroll_top: f64) -> u32 {
        // Number of pages whose top is <= scroll_top.
        let count = self.pages.partition_point(|p| p.top_offset <= scroll_top);
        count.clamp(1, self.pages.len()) as u32
    }

    /// Pages intersecting the vertical range `[top, bottom)`.
    pub fn pages_in_range(&self, top: f64, bottom: f64) -> std::ops::RangeInclusive<u32> {
        let first = self.page_from_scroll_offset(top);
        let last = if bottom > top {
            // A page starting exactly at `bottom` is not visible.
            let count = self.pages.partition_point(|p| p.top_offset < bottom);
            (count.clamp(1, self.pages.len()) as u32).max(first)
        } else {
            first
        };
        first..=last
    }
}
