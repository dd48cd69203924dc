use tracing::debug;

use crate::builder::DocumentBuilder;
use crate::config::PageCraftConfig;
use crate::error::Result;
use crate::filename::sanitize_filename;
use crate::merge_queue::{MergeEntrySummary, MergeQueue};
use crate::page_model::Direction;
use crate::pipeline::merge;
use crate::session::{ExportedFile, StatusReporter};

/// Merge flow: an ordered file queue and its export.
pub struct MergeSession<B: DocumentBuilder> {
    builder: B,
    queue: MergeQueue,
    status: StatusReporter,
    default_filename: String,
}

impl<B: DocumentBuilder> MergeSession<B> {
    pub fn new(builder: B, config: &PageCraftConfig) -> Self {
        Self {
            builder,
            queue: MergeQueue::new(),
            status: StatusReporter::new(),
            default_filename: config.output.merge_filename.clone(),
        }
    }

    /// Queue a file. Bytes are validated at export time, not here.
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> u64 {
        let id = self.queue.push(name, bytes);
        debug!(id, name, queued = self.queue.len(), "file queued for merge");
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        self.queue.remove(id)
    }

    pub fn move_entry(&mut self, id: u64, direction: Direction) -> bool {
        self.queue.swap_adjacent(id, direction)
    }

    pub fn queue(&self) -> &MergeQueue {
        &self.queue
    }

    pub fn summaries(&self) -> Vec<MergeEntrySummary> {
        self.queue.summaries()
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Merge the queue in its current order. The queue is left intact on
    /// both success and failure.
    pub fn export(&self, filename: Option<&str>) -> Result<ExportedFile> {
        self.export_with_progress(filename, |_, _, _| {})
    }

    /// Like [`export`](Self::export), also forwarding each progress step to
    /// `on_progress` as it happens.
    pub fn export_with_progress<F>(
        &self,
        filename: Option<&str>,
        mut on_progress: F,
    ) -> Result<ExportedFile>
    where
        F: FnMut(usize, usize, &str),
    {
        let status = &self.status;
        let result = merge(&self.builder, &self.queue, |current, total, message| {
            status.progress(current as u32, total as u32, message);
            on_progress(current, total, message);
        });

        match result {
            Ok(bytes) => {
                let filename = sanitize_filename(filename.unwrap_or(""), &self.default_filename);
                status.ready(format!(
                    "Merged {} files into {}",
                    self.queue.len(),
                    filename
                ));
                Ok(ExportedFile { filename, bytes })
            }
            Err(e) => {
                status.failed(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuiltDocument, LopdfBuilder};
    use crate::error::PageCraftError;
    use crate::sample::{page_label, sample_document};
    use crate::session::Status;
    use pretty_assertions::assert_eq;

    fn session() -> MergeSession<LopdfBuilder> {
        MergeSession::new(LopdfBuilder, &PageCraftConfig::default())
    }

    #[test]
    fn test_export_in_queue_order() {
        let mut session = session();
        let a = session.add_file("a.pdf", sample_document("A", 1).unwrap());
        session.add_file("b.pdf", sample_document("B", 2).unwrap());
        assert!(session.move_entry(a, Direction::Down));

        let file = session.export(Some("")).unwrap();
        assert_eq!(file.filename, "merged.pdf");

        let doc = LopdfBuilder.load(file.bytes).unwrap();
        let labels: Vec<_> = (0..doc.page_count())
            .filter_map(|i| page_label(doc.document(), i))
            .collect();
        assert_eq!(labels, vec!["B page 1", "B page 2", "A page 1"]);
        assert!(matches!(session.status().current(), Status::Ready { .. }));
    }

    #[test]
    fn test_failed_export_keeps_queue() {
        let mut session = session();
        session.add_file("a.pdf", sample_document("A", 1).unwrap());
        let bad = session.add_file("bad.txt", b"no header in here".to_vec());

        let err = session.export(None).unwrap_err();
        assert!(matches!(err, PageCraftError::MergeEntryFailed { position: 2, .. }));
        assert_eq!(session.queue().len(), 2);
        match session.status().current() {
            Status::Failed { message } => assert!(message.contains("bad.txt"), "{}", message),
            other => panic!("unexpected status: {:?}", other),
        }

        assert!(session.remove(bad));
        assert!(session.export(Some("joined")).is_ok());
    }

    #[test]
    fn test_progress_forwarded_per_entry() {
        let mut session = session();
        session.add_file("a.pdf", sample_document("A", 1).unwrap());
        session.add_file("b.pdf", sample_document("B", 1).unwrap());

        let mut steps = Vec::new();
        session
            .export_with_progress(None, |current, total, message| {
                steps.push((current, total, message.to_string()))
            })
            .unwrap();
        assert_eq!(
            steps,
            vec![
                (0, 2, "Processing document 1/2: a.pdf".to_string()),
                (1, 2, "Processing document 2/2: b.pdf".to_string()),
                (2, 2, "Finalizing...".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_queue_fails() {
        assert!(matches!(
            session().export(None),
            Err(PageCraftError::NoFilesToMerge)
        ));
    }

    #[test]
    fn test_summaries_omit_bytes() {
        let mut session = session();
        let id = session.add_file("a.pdf", vec![0; 42]);
        assert_eq!(
            session.summaries(),
            vec![MergeEntrySummary {
                id,
                name: "a.pdf".to_string(),
                size_bytes: 42
            }]
        );
    }
}
