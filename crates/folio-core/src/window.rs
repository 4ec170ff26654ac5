//! Page window manager.
//!
//! Only pages near the current page are mounted. Mounting is split in two so
//! an async host can await the rasterizer without holding the window: [`plan`]
//! hands out tickets, and [`finish_mount`] accepts the result later, after
//! checking that the ticket is still current. Results for pages that left the
//! window in the meantime are dropped.
//!
//! [`plan`]: PageWindow::plan
//! [`finish_mount`]: PageWindow::finish_mount

use crate::layout::PositionIndex;
use crate::raster::{RasterHandle, RasterResult, Rasterizer, RenderTarget, TextRun};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Lifecycle of a page slot. A page without a slot is unmounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountState {
    /// A render request is in flight.
    Mounting,
    Mounted,
    /// The last render failed; see [`PageWindow::retry`].
    Failed,
}

/// Container for one mounted page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSlot {
    page_number: u32,
    state: MountState,
    generation: u64,
    /// Scale of the latest render request.
    scale: f64,
    #[serde(skip)]
    raster: Option<RasterHandle>,
    #[serde(skip)]
    text_runs: Option<Vec<TextRun>>,
    has_annotation_layer: bool,
    error: Option<String>,
}

impl PageSlot {
    fn new(page_number: u32, generation: u64, scale: f64) -> Self {
        Self {
            page_number,
            state: MountState::Mounting,
            generation,
            scale,
            raster: None,
            text_runs: None,
            has_annotation_layer: false,
            error: None,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Latest bitmap. Kept while a re-render at a new scale is in flight.
    pub fn raster(&self) -> Option<RasterHandle> {
        self.raster
    }

    pub fn text_runs(&self) -> Option<&[TextRun]> {
        self.text_runs.as_deref()
    }

    pub fn has_annotation_layer(&self) -> bool {
        self.has_annotation_layer
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Permission to deliver one render result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountTicket {
    pub page: u32,
    pub generation: u64,
    pub target: RenderTarget,
}

/// What the rasterizer produced for a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub raster: RasterHandle,
    /// `None` when the text layer could not be produced.
    pub text_runs: Option<Vec<TextRun>>,
}

/// Result of reconciling the window with a new current page.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    pub target_page: u32,
    pub range: RangeInclusive<u32>,
    /// Pages that got a new slot and must be rendered.
    pub mount: Vec<MountTicket>,
    /// Pages whose slot was destroyed.
    pub unmount: Vec<u32>,
}

impl WindowPlan {
    pub fn is_empty(&self) -> bool {
        self.mount.is_empty() && self.unmount.is_empty()
    }
}

/// What [`PageWindow::finish_mount`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    Failed(String),
    /// The page left the window or was re-requested; the result was dropped.
    Stale,
}

/// The set of page slots for one document.
#[derive(Debug, Clone)]
pub struct PageWindow {
    buffer_radius: u32,
    slots: BTreeMap<u32, PageSlot>,
    next_generation: u64,
    pinned: Option<u32>,
}

impl PageWindow {
    pub fn new(buffer_radius: u32) -> Self {
        Self {
            buffer_radius,
            slots: BTreeMap::new(),
            next_generation: 0,
            pinned: None,
        }
    }

    pub fn buffer_radius(&self) -> u32 {
        self.buffer_radius
    }

    /// Pages that should be mounted around `target`.
    pub fn visible_range(target: u32, buffer_radius: u32, total: u32) -> RangeInclusive<u32> {
        let total = total.max(1);
        let target = target.clamp(1, total);
        let first = target.saturating_sub(buffer_radius).max(1);
        let last = target.saturating_add(buffer_radius).min(total);
        first..=last
    }

    /// Reconcile the slots with `target_page`.
    ///
    /// In pinned mode the pinned page is the only member of the window and
    /// `target_page` is ignored.
    pub fn plan(&mut self, target_page: u32, index: &PositionIndex) -> WindowPlan {
        let total = index.page_count();
        let range = match self.pinned {
            Some(page) => page..=page,
            None => Self::visible_range(target_page, self.buffer_radius, total),
        };

        let unmount: Vec<u32> = self
            .slots
            .keys()
            .copied()
            .filter(|page| !range.contains(page))
            .collect();
        for page in &unmount {
            self.slots.remove(page);
        }

        let mut mount = Vec::new();
        for page in range.clone() {
            if self.slots.contains_key(&page) {
                continue;
            }
            if let Some(ticket) = self.new_ticket(page, index) {
                self.slots
                    .insert(page, PageSlot::new(page, ticket.generation, index.scale()));
                mount.push(ticket);
            }
        }

        log::debug!(
            "Window plan: target {target_page}, range {range:?}, mount {:?}, unmount {unmount:?}",
            mount.iter().map(|t| t.page).collect::<Vec<_>>()
        );
        WindowPlan {
            target_page,
            range,
            mount,
            unmount,
        }
    }

    /// Accept a render result for `ticket`.
    pub fn finish_mount(&mut self, ticket: &MountTicket, result: RasterResult<RenderOutput>) -> MountOutcome {
        let Some(slot) = self.slots.get_mut(&ticket.page) else {
            log::debug!("Dropping render of page {}: no longer in window", ticket.page);
            return MountOutcome::Stale;
        };
        if slot.generation != ticket.generation {
            log::debug!(
                "Dropping render of page {}: generation {} superseded by {}",
                ticket.page,
                ticket.generation,
                slot.generation
            );
            return MountOutcome::Stale;
        }
        match result {
            Ok(output) => {
                slot.state = MountState::Mounted;
                slot.raster = Some(output.raster);
                slot.text_runs = output.text_runs;
                slot.has_annotation_layer = true;
                slot.error = None;
                MountOutcome::Mounted
            }
            Err(err) => {
                log::warn!("Failed to render page {}: {err}", ticket.page);
                let reason = err.to_string();
                slot.state = MountState::Failed;
                slot.error = Some(reason.clone());
                MountOutcome::Failed(reason)
            }
        }
    }

    /// Re-request every slot at the index's scale. Bitmaps stay in place
    /// until the new renders arrive.
    pub fn rescale(&mut self, index: &PositionIndex) -> Vec<MountTicket> {
        let pages: Vec<u32> = self.slots.keys().copied().collect();
        let mut tickets = Vec::with_capacity(pages.len());
        for page in pages {
            let Some(ticket) = self.new_ticket(page, index) else {
                continue;
            };
            if let Some(slot) = self.slots.get_mut(&page) {
                slot.generation = ticket.generation;
                slot.scale = index.scale();
                slot.state = MountState::Mounting;
                tickets.push(ticket);
            }
        }
        tickets
    }

    /// Re-request a failed page.
    pub fn retry(&mut self, page: u32, index: &PositionIndex) -> Option<MountTicket> {
        if self.slots.get(&page)?.state != MountState::Failed {
            return None;
        }
        let ticket = self.new_ticket(page, index)?;
        let slot = self.slots.get_mut(&page)?;
        slot.generation = ticket.generation;
        slot.scale = index.scale();
        slot.state = MountState::Mounting;
        Some(ticket)
    }

    /// Restrict the window to a single page.
    pub fn pin(&mut self, page: u32) {
        self.pinned = Some(page);
    }

    pub fn unpin(&mut self) -> Option<u32> {
        self.pinned.take()
    }

    pub fn pinned(&self) -> Option<u32> {
        self.pinned
    }

    pub fn slot(&self, page: u32) -> Option<&PageSlot> {
        self.slots.get(&page)
    }

    pub fn slots(&self) -> impl Iterator<Item = &PageSlot> {
        self.slots.values()
    }

    /// Pages with a slot, in any state.
    pub fn pages(&self) -> Vec<u32> {
        self.slots.keys().copied().collect()
    }

    pub fn is_mounted(&self, page: u32) -> bool {
        self.slots
            .get(&page)
            .is_some_and(|s| s.state == MountState::Mounted)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Destroy every slot.
    pub fn clear(&mut self) -> Vec<u32> {
        let pages = self.pages();
        self.slots.clear();
        pages
    }

    fn new_ticket(&mut self, page: u32, index: &PositionIndex) -> Option<MountTicket> {
        let layout = index.layout(page)?;
        self.next_generation += 1;
        Some(MountTicket {
            page,
            generation: self.next_generation,
            target: RenderTarget {
                page,
                scale: index.scale(),
                size: layout.size(),
            },
        })
    }
}

/// Render the bitmap and text layer a ticket asks for.
///
/// A failed text layer does not fail the mount.
pub async fn render_ticket<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    ticket: &MountTicket,
) -> RasterResult<RenderOutput> {
    let raster = rasterizer.render_page(ticket.target).await?;
    let text_runs = match rasterizer.text_runs(ticket.page).await {
        Ok(runs) => Some(runs),
        Err(err) => {
            log::warn!("No text layer for page {}: {err}", ticket.page);
            None
        }
    };
    Ok(RenderOutput { raster, text_runs })
}
