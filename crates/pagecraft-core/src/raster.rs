//! Rasterization engine collaborator
//!
//! The engine turns document bytes into page bitmaps. It lives outside the
//! crate (PDF.js in the browser, a native renderer elsewhere); this module
//! only fixes its interface and the surface rendered pages land on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// RGBA pixels, row-major, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Current page and total pages, both 1-based for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageIndicator {
    pub current: u32,
    pub total: u32,
}

/// Shared flag requesting that a render stop.
///
/// Engines may poll it to abort early. The scheduler checks it again when a
/// render completes, so an engine that ignores it is still safe.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait(?Send)]
pub trait RasterEngine {
    type Document: RasterDocument;

    /// Parse `bytes`, consuming them.
    async fn open(&self, bytes: Vec<u8>) -> Result<Self::Document>;
}

#[async_trait(?Send)]
pub trait RasterDocument {
    fn page_count(&self) -> u32;

    /// Render the 0-based page at `scale`. Returns `RenderCancelled` when
    /// the engine noticed `cancel` and stopped.
    async fn render_page(
        &self,
        page_index: u32,
        scale: f32,
        cancel: &CancellationToken,
    ) -> Result<Bitmap>;

    /// Release engine resources. Later renders on this handle may fail.
    fn close(&self);
}

/// Where rendered pages are drawn.
pub trait Surface {
    fn paint(&mut self, bitmap: &Bitmap, indicator: PageIndicator);

    fn clear(&mut self);
}
