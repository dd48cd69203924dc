//! Client-side PDF page composition
//!
//! Three pipelines share one byte normalizer and one lopdf-backed document
//! builder:
//! - Reorganize: reorder, rotate and drop pages of one document
//! - Merge: concatenate whole documents in a user-chosen order
//! - Scrub: rebuild a document without its descriptive metadata
//!
//! Page previews go through a [`render::RenderScheduler`], which guarantees
//! that only the most recently requested page reaches the surface.

pub mod builder;
pub mod command;
pub mod config;
pub mod error;
pub mod filename;
pub mod merge_queue;
pub mod normalize;
pub mod page_model;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod sample;
pub mod session;

use serde::Serialize;

pub use builder::{BuiltDocument, DocumentBuilder, InfoField, LopdfBuilder, LopdfDocument};
pub use command::{execute, PdfCommand, ProcessMetrics, ProcessResult};
pub use config::PageCraftConfig;
pub use error::{PageCraftError, Result};
pub use filename::sanitize_filename;
pub use merge_queue::{MergeEntry, MergeEntrySummary, MergeQueue};
pub use normalize::{normalize, DiagnosticPreview, PdfBytes};
pub use page_model::{Direction, PageDescriptor, PageModel, ProjectedPage, Rotation};
pub use pipeline::{merge, reorganize, scrub};
pub use render::{LoadOutcome, RenderOutcome, RenderScheduler};
pub use session::{ExportedFile, MergeSession, OrganizeSession, Organizer, ScrubSession, Status};

/// Parse PDF bytes and return page count
pub fn page_count(bytes: &[u8]) -> Result<u32> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PageCraftError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// What a loaded file looks like, before any pipeline touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub page_count: u32,
    /// Bytes skipped before the `%PDF-` signature
    pub header_offset: usize,
    pub version: String,
    pub encrypted: bool,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Normalize and parse `bytes` and summarize the document.
pub fn inspect(bytes: &[u8]) -> Result<DocumentSummary> {
    let normalized = normalize(bytes)?;
    let header_offset = normalized.header_offset();
    let doc = LopdfBuilder.load(normalized.into_inner())?;

    Ok(DocumentSummary {
        page_count: doc.page_count(),
        header_offset,
        version: doc.version().to_string(),
        encrypted: doc.is_encrypted(),
        title: doc.info(InfoField::Title),
        author: doc.info(InfoField::Author),
    })
}
