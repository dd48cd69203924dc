//! Scrub: rebuild a document without its metadata.

use tracing::info;

use crate::builder::{BuiltDocument, DocumentBuilder, InfoField};
use crate::error::Result;
use crate::pipeline::load_source;

/// Info fields emptied by a scrub. Producer is overwritten instead.
pub const SCRUBBED_FIELDS: [InfoField; 5] = [
    InfoField::Title,
    InfoField::Author,
    InfoField::Subject,
    InfoField::Keywords,
    InfoField::Creator,
];

/// Copy every page of `source` in its natural order into a new document,
/// blank the descriptive Info fields and stamp `producer`.
///
/// Document-level objects the pages do not reference (XMP streams,
/// attachments, the old Info dictionary) are left behind by the copy.
pub fn scrub_document<B: DocumentBuilder>(
    builder: &B,
    source: &B::Document,
    producer: &str,
) -> Result<Vec<u8>> {
    let mut output = builder.create();
    let pages = output.copy_pages(source, &source.page_indices())?;
    for page in &pages {
        output.add_page(page)?;
    }

    for field in SCRUBBED_FIELDS {
        output.set_info(field, "");
    }
    output.set_info(InfoField::Producer, producer);

    let bytes = output.save()?;
    info!(
        pages = pages.len(),
        size_bytes = bytes.len(),
        "scrubbed document exported"
    );
    Ok(bytes)
}

/// Normalize and load `bytes`, then scrub it.
pub fn scrub<B: DocumentBuilder>(builder: &B, bytes: &[u8], producer: &str) -> Result<Vec<u8>> {
    let source = load_source(builder, bytes)?;
    scrub_document(builder, &source, producer)
}
