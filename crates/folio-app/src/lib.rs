//! Folio inspection tool
//!
//! Drives the viewer core headlessly against a page-size manifest and
//! reports the resulting layout, page window and annotations as JSON.

use clap::Parser;
use folio_core::layout::PositionIndex;
use folio_core::window::PageSlot;
use folio_core::{
    DocumentViewer, ExportedShape, MemoryRasterizer, PageSize, ViewerConfig, ViewerError,
};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid manifest: {0}")]
    Manifest(String),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error(transparent)]
    Config(#[from] folio_core::ConfigError),
    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Command line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "folio", version, about = "Inspect page layout, windowing and annotations")]
pub struct Args {
    /// JSON manifest listing page sizes at scale 1.0
    pub manifest: PathBuf,

    /// Viewer configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Annotations to import (JSON array of shapes)
    #[arg(long)]
    pub annotations: Option<PathBuf>,

    /// Zoom scale to apply after opening
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Scroll offset in pixels, applied after zooming
    #[arg(long, conflicts_with = "page")]
    pub scroll: Option<f64>,

    /// Page to scroll to, applied after zooming
    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, default_value_t = 800.0)]
    pub viewport_width: f64,

    #[arg(long, default_value_t = 600.0)]
    pub viewport_height: f64,

    /// Include the full page layout in the report
    #[arg(long)]
    pub layout: bool,
}

/// Page sizes of a document.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub pages: Vec<PageSize>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let manifest: Self =
            serde_json::from_str(json).map_err(|e| AppError::Manifest(e.to_string()))?;
        if manifest.pages.is_empty() {
            return Err(AppError::Manifest("no pages".to_string()));
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        Self::from_json(&read(path)?)
    }
}

/// What the tool prints.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub page_count: u32,
    pub scale: f64,
    pub scroll_top: f64,
    pub current_page: u32,
    pub visible_pages: Vec<u32>,
    pub content_width: f64,
    pub content_height: f64,
    pub window: Vec<PageSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<PositionIndex>,
    pub annotations: Vec<ExportedShape>,
}

impl Report {
    fn new(viewer: &DocumentViewer<MemoryRasterizer>, with_layout: bool) -> Self {
        let content = viewer.index().content_size();
        Self {
            page_count: viewer.page_count(),
            scale: viewer.scale(),
            scroll_top: viewer.scroll_top(),
            current_page: viewer.current_page(),
            visible_pages: viewer.visible_pages().collect(),
            content_width: content.width,
            content_height: content.height,
            window: viewer.window().slots().cloned().collect(),
            layout: with_layout.then(|| viewer.index().clone()),
            annotations: viewer.export_shapes(),
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn read(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Open the manifest, apply the requested zoom and scroll, and report.
pub async fn run(args: &Args) -> Result<Report, AppError> {
    let manifest = Manifest::load(&args.manifest)?;
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    log::info!(
        "Loaded manifest {} with {} pages",
        args.manifest.display(),
        manifest.pages.len()
    );

    let viewport = Size::new(args.viewport_width.max(0.0), args.viewport_height.max(0.0));
    let rasterizer = MemoryRasterizer::new(manifest.pages);
    let mut viewer = DocumentViewer::open(rasterizer, config, viewport).await?;

    if let Some(path) = &args.annotations {
        let count = viewer.import_json(&read(path)?)?;
        log::info!("Imported {count} annotations");
    }
    if let Some(scale) = args.zoom {
        viewer.apply_zoom(scale).await?;
    }
    if let Some(page) = args.page {
        viewer.scroll_to_page(page).await;
    } else if let Some(scroll) = args.scroll {
        viewer.scroll_to(scroll).await;
    }

    Ok(Report::new(&viewer, args.layout))
}
