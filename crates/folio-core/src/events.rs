//! Per-document notifications.

use crate::shapes::{Shape, ShapeId, ShapeKind};
use serde::Serialize;

/// What the current selection is, as reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionInfo {
    pub id: ShapeId,
    pub kind: ShapeKind,
}

/// Everything a document viewer reports to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerEvent {
    ScaleChanged { scale: f64, previous: f64 },
    CurrentPageChanged { page: u32 },
    PageMounted { page: u32 },
    PageUnmounted { page: u32 },
    PageRenderFailed { page: u32, reason: String },
    AnnotationCreated { shape: Shape },
    AnnotationUpdated { shape: Shape },
    AnnotationDeleted { id: ShapeId },
    AnnotationSelected { shape: Shape },
    AnnotationDeselected { id: ShapeId },
    /// Fired after every selection change; `None` means nothing is selected.
    SelectionChanged { selection: Option<SelectionInfo> },
    DrawStarted { page: u32, kind: ShapeKind },
    /// `shape` is `None` when the drawing was discarded or cancelled.
    DrawFinished { page: u32, kind: ShapeKind, shape: Option<ShapeId> },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ViewerEvent)>;

/// Publish/subscribe bus owned by one document instance.
///
/// Listeners run synchronously in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewerEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &ViewerEvent) {
        log::trace!("event: {event:?}");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = ViewerEvent>) {
        for event in events {
            self.emit(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
