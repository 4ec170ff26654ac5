//! Folio Core Library
//!
//! Platform-agnostic core of the Folio document viewer: page layout and
//! windowing, zoom with scroll anchoring, and shape annotations.

pub mod annotations;
pub mod config;
pub mod drawing;
pub mod events;
pub mod handles;
pub mod input;
pub mod layout;
pub mod manipulation;
pub mod overlay;
pub mod raster;
pub mod shapes;
pub mod throttle;
pub mod viewer;
pub mod window;
pub mod zoom;

pub use annotations::{AnnotationError, AnnotationRegistry, ExportedShape};
pub use config::{AnnotationConfig, ConfigError, ViewerConfig, ZoomConfig};
pub use drawing::{DrawOutcome, DrawingSession};
pub use events::{EventBus, SelectionInfo, SubscriptionId, ViewerEvent};
pub use handles::{Handle, HandleKind, HandleShape, SelectionOverlay};
pub use input::{Key, MouseButton, PointerEvent};
pub use layout::{LayoutError, PageLayout, PositionIndex};
pub use manipulation::ManipulationState;
pub use overlay::{OverlayItem, OverlayScene};
pub use raster::{MemoryRasterizer, PageSize, RasterError, RasterHandle, Rasterizer, RenderTarget, TextRun};
pub use shapes::{Geometry, ScreenGeometry, Shape, ShapeId, ShapeKind, ShapeStyle, StrokeStyle};
pub use throttle::Throttle;
pub use viewer::{DocumentViewer, ViewerError};
pub use window::{MountOutcome, MountState, MountTicket, PageSlot, PageWindow, WindowPlan};
pub use zoom::{ScrollAnchor, ZoomChange, ZoomCoordinator};
