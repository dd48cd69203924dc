//! Composition pipelines
//!
//! Each pipeline normalizes its inputs, loads them through a
//! [`DocumentBuilder`], copies pages into a freshly created output document
//! and serializes it. Source documents are never modified, so nothing the
//! copied pages do not reference can reach the output.

pub mod merge;
pub mod reorganize;
pub mod scrub;

pub use merge::merge;
pub use reorganize::{export_projection, reorganize};
pub use scrub::{scrub, scrub_document};

use crate::builder::DocumentBuilder;
use crate::error::Result;
use crate::normalize::normalize;

/// Normalize raw input and hand it to the builder.
pub fn load_source<B: DocumentBuilder>(builder: &B, bytes: &[u8]) -> Result<B::Document> {
    let normalized = normalize(bytes)?;
    builder.load(normalized.into_inner())
}

#[cfg(test)]
pub(crate) mod fake {
    //! A builder that records calls instead of producing PDF bytes.

    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::builder::{BuiltDocument, DocumentBuilder, InfoField};
    use crate::error::{PageCraftError, Result};
    use crate::page_model::Rotation;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Copy(Vec<u32>),
        Add(u32),
        Rotate(u32, u16),
        Info(InfoField, String),
        Save,
    }

    #[derive(Default, Clone)]
    pub struct RecordingBuilder {
        pub calls: Rc<RefCell<Vec<Call>>>,
    }

    pub struct RecordingDocument {
        page_count: u32,
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl DocumentBuilder for RecordingBuilder {
        type Document = RecordingDocument;

        fn create(&self) -> RecordingDocument {
            RecordingDocument {
                page_count: 0,
                calls: self.calls.clone(),
            }
        }

        /// Page count is the digit following the header, e.g. `%PDF-3`.
        fn load(&self, bytes: Vec<u8>) -> Result<RecordingDocument> {
            let page_count = bytes
                .get(5)
                .filter(|b| b.is_ascii_digit())
                .map(|b| u32::from(b - b'0'))
                .ok_or_else(|| PageCraftError::ParseError("no page count".into()))?;
            Ok(RecordingDocument {
                page_count,
                calls: self.calls.clone(),
            })
        }
    }

    impl BuiltDocument for RecordingDocument {
        type PageRef = u32;

        fn page_count(&self) -> u32 {
            self.page_count
        }

        fn copy_pages(&mut self, source: &Self, indices: &[u32]) -> Result<Vec<u32>> {
            if let Some(&index) = indices.iter().find(|&&i| i >= source.page_count) {
                return Err(PageCraftError::PageNotFound {
                    index,
                    page_count: source.page_count,
                });
            }
            self.calls.borrow_mut().push(Call::Copy(indices.to_vec()));
            Ok(indices.to_vec())
        }

        fn add_page(&mut self, page: &u32) -> Result<()> {
            self.page_count += 1;
            self.calls.borrow_mut().push(Call::Add(*page));
            Ok(())
        }

        fn set_page_rotation(&mut self, page: &u32, rotation: Rotation) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Rotate(*page, rotation.degrees()));
            Ok(())
        }

        fn set_info(&mut self, field: InfoField, value: &str) {
            self.calls
                .borrow_mut()
                .push(Call::Info(field, value.to_string()));
        }

        fn info(&self, _field: InfoField) -> Option<String> {
            None
        }

        fn save(&mut self) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(Call::Save);
            Ok(b"%PDF-saved".to_vec())
        }
    }
}
