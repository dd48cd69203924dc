//! Merge: concatenate whole documents in queue order.

use tracing::info;

use crate::builder::{BuiltDocument, DocumentBuilder};
use crate::error::{PageCraftError, Result};
use crate::merge_queue::{MergeEntry, MergeQueue};
use crate::pipeline::load_source;

/// Merge every queued document into one.
///
/// The output holds all pages of the first entry in their own order, then
/// all pages of the second, and so on. Any failing entry aborts the whole
/// merge with `MergeEntryFailed`; no partial output is produced.
///
/// `on_progress(current, total, message)` is called once per entry before
/// it is processed.
pub fn merge<B, F>(builder: &B, queue: &MergeQueue, mut on_progress: F) -> Result<Vec<u8>>
where
    B: DocumentBuilder,
    F: FnMut(usize, usize, &str),
{
    if queue.is_empty() {
        return Err(PageCraftError::NoFilesToMerge);
    }

    let total = queue.len();
    let mut output = builder.create();
    let mut page_total = 0;

    for (i, entry) in queue.entries().iter().enumerate() {
        on_progress(
            i,
            total,
            &format!("Processing document {}/{}: {}", i + 1, total, entry.name()),
        );
        page_total += append_entry(builder, &mut output, entry).map_err(|e| {
            PageCraftError::MergeEntryFailed {
                position: i + 1,
                id: entry.id(),
                name: entry.name().to_string(),
                source: Box::new(e),
            }
        })?;
    }

    on_progress(total, total, "Finalizing...");
    let bytes = output.save()?;
    info!(
        documents = total,
        pages = page_total,
        size_bytes = bytes.len(),
        "merged document exported"
    );
    Ok(bytes)
}

fn append_entry<B: DocumentBuilder>(
    builder: &B,
    output: &mut B::Document,
    entry: &MergeEntry,
) -> Result<usize> {
    let source = load_source(builder, entry.bytes())?;
    let pages = output.copy_pages(&source, &source.page_indices())?;
    for page in &pages {
        output.add_page(page)?;
    }
    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LopdfBuilder;
    use crate::pipeline::fake::{Call, RecordingBuilder};
    use crate::sample::{page_label, sample_document};
    use pretty_assertions::assert_eq;

    fn labels(bytes: Vec<u8>) -> Vec<String> {
        let doc = LopdfBuilder.load(bytes).unwrap();
        (0..doc.page_count())
            .filter_map(|i| page_label(doc.document(), i))
            .collect()
    }

    #[test]
    fn test_merge_empty_fails() {
        let result = merge(&LopdfBuilder, &MergeQueue::new(), |_, _, _| {});
        assert!(matches!(result, Err(PageCraftError::NoFilesToMerge)));
    }

    #[test]
    fn test_merge_two_documents_in_queue_order() {
        let mut queue = MergeQueue::new();
        queue.push("a.pdf", sample_document("A", 2).unwrap());
        queue.push("b.pdf", sample_document("B", 3).unwrap());

        let merged = merge(&LopdfBuilder, &queue, |_, _, _| {}).unwrap();
        assert_eq!(
            labels(merged),
            vec!["A page 1", "A page 2", "B page 1", "B page 2", "B page 3"]
        );
    }

    #[test]
    fn test_merge_single_document_is_rebuilt() {
        let mut queue = MergeQueue::new();
        queue.push("only.pdf", sample_document("Only", 2).unwrap());
        let merged = merge(&LopdfBuilder, &queue, |_, _, _| {}).unwrap();
        assert_eq!(labels(merged), vec!["Only page 1", "Only page 2"]);
    }

    #[test]
    fn test_merge_follows_reordered_queue() {
        let mut queue = MergeQueue::new();
        queue.push("a.pdf", sample_document("A", 1).unwrap());
        let b = queue.push("b.pdf", sample_document("B", 1).unwrap());
        queue.swap_adjacent(b, crate::page_model::Direction::Up);

        let merged = merge(&LopdfBuilder, &queue, |_, _, _| {}).unwrap();
        assert_eq!(labels(merged), vec!["B page 1", "A page 1"]);
    }

    #[test]
    fn test_bad_entry_aborts_whole_merge() {
        let builder = RecordingBuilder::default();
        let mut queue = MergeQueue::new();
        queue.push("good.pdf", b"%PDF-2".to_vec());
        let bad = queue.push("bad.html", b"<html>not a pdf</html>".to_vec());
        queue.push("never.pdf", b"%PDF-1".to_vec());

        let result = merge(&builder, &queue, |_, _, _| {});
        match result {
            Err(PageCraftError::MergeEntryFailed {
                position,
                id,
                name,
                source,
            }) => {
                assert_eq!(position, 2);
                assert_eq!(id, bad);
                assert_eq!(name, "bad.html");
                assert!(matches!(*source, PageCraftError::HeaderNotFound { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!builder.calls.borrow().contains(&Call::Save));
    }

    #[test]
    fn test_progress_reported_per_entry() {
        let mut queue = MergeQueue::new();
        queue.push("a.pdf", b"%PDF-1".to_vec());
        queue.push("b.pdf", b"%PDF-1".to_vec());

        let mut steps = Vec::new();
        merge(&RecordingBuilder::default(), &queue, |current, total, _| {
            steps.push((current, total))
        })
        .unwrap();
        assert_eq!(steps, vec![(0, 2), (1, 2), (2, 2)]);
    }
}
