//! Per-page annotation surface.

use crate::drawing::DrawingSession;
use crate::manipulation::ManipulationState;
use crate::shapes::Geometry;
use kurbo::Size;

/// What the pointer is doing on a page.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Drawing(DrawingSession),
    Manipulating {
        state: ManipulationState,
        /// Logical geometry before the gesture, to detect no-op drags.
        before: Geometry,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Annotation state scoped to one mounted page.
///
/// Created when the page mounts and dropped when it unmounts. It owns only
/// transient interaction state; persisted shapes live in the registry.
#[derive(Debug, Clone)]
pub struct PageAnnotations {
    page_number: u32,
    /// Page size at scale 1.0.
    base_size: Size,
    pub(crate) gesture: Gesture,
}

impl PageAnnotations {
    pub fn new(page_number: u32, base_size: Size) -> Self {
        Self {
            page_number,
            base_size,
            gesture: Gesture::Idle,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn base_size(&self) -> Size {
        self.base_size
    }

    pub(crate) fn set_base_size(&mut self, size: Size) {
        self.base_size = size;
    }

    /// Drawing surface in screen pixels at `scale`.
    pub fn surface(&self, scale: f64) -> Size {
        self.base_size * scale
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }
}
