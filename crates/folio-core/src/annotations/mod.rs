//! Annotation management.
//!
//! The [`AnnotationRegistry`] is the document-level store of persisted shapes
//! and the single owner of the selection. Each mounted page gets a
//! [`PageAnnotations`] entry holding its drawing surface and in-flight
//! gesture; unmounting a page drops that entry but never the shapes.

mod page;
mod registry;

pub use page::{Gesture, PageAnnotations};
pub use registry::AnnotationRegistry;

use crate::shapes::{Geometry, ScreenGeometry, Shape, ShapeId, ShapeKind, ShapeStyle};
use serde::Serialize;
use thiserror::Error;

/// Annotation errors.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Invalid page number {0}")]
    InvalidPage(u32),
    #[error("Shape {0} has non-finite geometry")]
    InvalidGeometry(ShapeId),
    #[error("Shape {0} has an invalid stroke width")]
    InvalidStyle(ShapeId),
    #[error("Shape {0} already exists")]
    DuplicateId(ShapeId),
    #[error("Failed to (de)serialize annotations: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persisted shape as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedShape {
    pub id: ShapeId,
    pub page_number: u32,
    pub kind: ShapeKind,
    pub style: ShapeStyle,
    /// Logical geometry, independent of zoom.
    pub geometry: Geometry,
    /// Screen geometry at the export scale.
    pub screen: ScreenGeometry,
}

impl ExportedShape {
    pub fn new(shape: &Shape, scale: f64) -> Self {
        Self {
            id: shape.id(),
            page_number: shape.page_number,
            kind: shape.kind(),
            style: shape.style.clone(),
            geometry: shape.geometry,
            screen: shape.to_screen(scale),
        }
    }
}

/// Check a shape before it enters the store.
fn validate_shape(shape: &Shape) -> Result<(), AnnotationError> {
    if shape.page_number == 0 {
        return Err(AnnotationError::InvalidPage(shape.page_number));
    }
    if !shape.geometry.is_finite() {
        return Err(AnnotationError::InvalidGeometry(shape.id()));
    }
    let width = shape.style.stroke_width;
    if !width.is_finite() || width < 0.0 {
        return Err(AnnotationError::InvalidStyle(shape.id()));
    }
    Ok(())
}
