use thiserror::Error;

use crate::normalize::DiagnosticPreview;

#[derive(Error, Debug)]
pub enum PageCraftError {
    #[error("Input too small to be a PDF ({len} bytes)")]
    EmptyInput { len: usize },

    #[error("No %PDF header found in input (first bytes: {preview})")]
    HeaderNotFound { preview: DiagnosticPreview },

    #[error("Network request failed with status {status}")]
    NetworkError { status: u16 },

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Nothing to export: every page was removed")]
    NothingToExport,

    #[error("No files to merge")]
    NoFilesToMerge,

    #[error("Merge failed on file {position} ({name}): {source}")]
    MergeEntryFailed {
        /// 1-based position in the merge queue at the time of the merge
        position: usize,
        id: u64,
        name: String,
        #[source]
        source: Box<PageCraftError>,
    },

    #[error("Render cancelled")]
    RenderCancelled,

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Page {index} does not exist (document has {page_count} pages)")]
    PageNotFound { index: u32, page_count: u32 },

    #[error("No document loaded")]
    NoDocumentLoaded,

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PageCraftError {
    /// Cancellation is an expected supersession outcome, not a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PageCraftError::RenderCancelled)
    }
}

pub type Result<T, E = PageCraftError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_render_cancelled_is_cancellation() {
        assert!(PageCraftError::RenderCancelled.is_cancellation());
        assert!(!PageCraftError::RenderFailed("boom".into()).is_cancellation());
        assert!(!PageCraftError::NothingToExport.is_cancellation());
    }

    #[test]
    fn test_merge_entry_failure_names_the_file() {
        let err = PageCraftError::MergeEntryFailed {
            position: 2,
            id: 7,
            name: "broken.pdf".into(),
            source: Box::new(PageCraftError::EmptyInput { len: 3 }),
        };
        let message = err.to_string();
        assert!(message.contains("file 2"));
        assert!(message.contains("broken.pdf"));
        assert!(message.contains("3 bytes"));
    }
}
