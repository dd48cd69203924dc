use crate::builder::{BuiltDocument, DocumentBuilder};
use crate::config::PageCraftConfig;
use crate::error::{PageCraftError, Result};
use crate::filename::sanitize_filename;
use crate::pipeline::{load_source, scrub_document};
use crate::session::{ExportedFile, StatusReporter};

/// Scrub flow: one loaded document, exported without its metadata.
pub struct ScrubSession<B: DocumentBuilder> {
    builder: B,
    source: Option<B::Document>,
    producer: String,
    status: StatusReporter,
    default_filename: String,
}

impl<B: DocumentBuilder> ScrubSession<B> {
    pub fn new(builder: B, config: &PageCraftConfig) -> Self {
        Self {
            builder,
            source: None,
            producer: config.producer.clone(),
            status: StatusReporter::new(),
            default_filename: config.output.scrub_filename.clone(),
        }
    }

    /// Load a document and return its page count. A failed load keeps the
    /// previously loaded document.
    pub fn load(&mut self, name: &str, bytes: &[u8]) -> Result<u32> {
        self.status.working(format!("Loading {}...", name));
        match load_source(&self.builder, bytes) {
            Ok(document) => {
                let page_count = document.page_count();
                self.source = Some(document);
                self.status
                    .ready(format!("Loaded {} ({} pages)", name, page_count));
                Ok(page_count)
            }
            Err(e) => {
                self.status.failed(&e);
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn export(&self, filename: Option<&str>) -> Result<ExportedFile> {
        self.status.working("Removing metadata...");
        let result = self
            .source
            .as_ref()
            .ok_or(PageCraftError::NoDocumentLoaded)
            .and_then(|source| scrub_document(&self.builder, source, &self.producer));

        match result {
            Ok(bytes) => {
                let filename = sanitize_filename(filename.unwrap_or(""), &self.default_filename);
                self.status.ready(format!("Exported {}", filename));
                Ok(ExportedFile { filename, bytes })
            }
            Err(e) => {
                self.status.failed(&e);
                Err(e)
            }
        }
    }
}
