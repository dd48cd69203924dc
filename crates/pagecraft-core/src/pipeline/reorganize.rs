//! Reorganize-export: rebuild one document from a page projection.

use tracing::info;

use crate::builder::{BuiltDocument, DocumentBuilder};
use crate::error::{PageCraftError, Result};
use crate::page_model::ProjectedPage;
use crate::pipeline::load_source;

/// Copy the projected pages of `source`, in projection order, into a new
/// document and serialize it.
///
/// A non-zero rotation replaces whatever rotation the source page carried;
/// a zero rotation leaves the copied page as it was.
pub fn export_projection<B: DocumentBuilder>(
    builder: &B,
    source: &B::Document,
    projection: &[ProjectedPage],
) -> Result<Vec<u8>> {
    if projection.is_empty() {
        return Err(PageCraftError::NothingToExport);
    }

    let indices: Vec<u32> = projection.iter().map(|p| p.source_index).collect();
    let mut output = builder.create();
    let pages = output.copy_pages(source, &indices)?;

    for (page, projected) in pages.iter().zip(projection) {
        output.add_page(page)?;
        if !projected.rotation.is_upright() {
            output.set_page_rotation(page, projected.rotation)?;
        }
    }

    let bytes = output.save()?;
    info!(
        pages = projection.len(),
        size_bytes = bytes.len(),
        "reorganized document exported"
    );
    Ok(bytes)
}

/// Normalize and load `bytes`, then export `projection` from it.
pub fn reorganize<B: DocumentBuilder>(
    builder: &B,
    bytes: &[u8],
    projection: &[ProjectedPage],
) -> Result<Vec<u8>> {
    if projection.is_empty() {
        return Err(PageCraftError::NothingToExport);
    }
    let source = load_source(builder, bytes)?;
    export_projection(builder, &source, projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{LopdfBuilder, LopdfDocument};
    use crate::page_model::{PageModel, Rotation};
    use crate::pipeline::fake::{Call, RecordingBuilder};
    use crate::sample::{page_label, sample_document};
    use lopdf::Object;
    use pretty_assertions::assert_eq;

    fn projected(source_index: u32, rotation: Rotation) -> ProjectedPage {
        ProjectedPage {
            source_index,
            rotation,
        }
    }

    fn rotate_entry(doc: &LopdfDocument, index: u32) -> Option<i64> {
        let page_id = doc.document().get_pages()[&(index + 1)];
        doc.document()
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Rotate")
            .and_then(Object::as_i64)
            .ok()
    }

    #[test]
    fn test_projection_drives_page_order_and_rotation() {
        let source = sample_document("Src", 3).unwrap();
        let out = reorganize(
            &LopdfBuilder,
            &source,
            &[projected(2, Rotation::R90), projected(0, Rotation::R0)],
        )
        .unwrap();

        let doc = LopdfBuilder.load(out).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(page_label(doc.document(), 0), Some("Src page 3".to_string()));
        assert_eq!(page_label(doc.document(), 1), Some("Src page 1".to_string()));
        assert_eq!(rotate_entry(&doc, 0), Some(90));
        assert_eq!(rotate_entry(&doc, 1), None);
    }

    #[test]
    fn test_upright_pages_get_no_rotation_call() {
        let builder = RecordingBuilder::default();
        reorganize(
            &builder,
            b"%PDF-3",
            &[projected(2, Rotation::R90), projected(0, Rotation::R0)],
        )
        .unwrap();

        assert_eq!(
            *builder.calls.borrow(),
            vec![
                Call::Copy(vec![2, 0]),
                Call::Add(2),
                Call::Rotate(2, 90),
                Call::Add(0),
                Call::Save,
            ]
        );
    }

    #[test]
    fn test_empty_projection_produces_nothing() {
        let builder = RecordingBuilder::default();
        let mut model = PageModel::new(3);
        for i in 0..3 {
            model.toggle_keep(i).unwrap();
        }

        let result = reorganize(&builder, b"%PDF-3", &model.project());
        assert!(matches!(result, Err(PageCraftError::NothingToExport)));
        assert!(builder.calls.borrow().is_empty());
    }

    #[test]
    fn test_junk_prefixed_input_is_normalized() {
        let mut input = b"garbage from a mail gateway\r\n".to_vec();
        input.extend(sample_document("Src", 2).unwrap());
        let out = reorganize(&LopdfBuilder, &input, &[projected(1, Rotation::R0)]).unwrap();
        let doc = LopdfBuilder.load(out).unwrap();
        assert_eq!(page_label(doc.document(), 0), Some("Src page 2".to_string()));
    }

    #[test]
    fn test_unknown_source_page_fails() {
        let source = sample_document("Src", 2).unwrap();
        let result = reorganize(&LopdfBuilder, &source, &[projected(4, Rotation::R0)]);
        assert!(matches!(
            result,
            Err(PageCraftError::PageNotFound { index: 4, .. })
        ));
    }
}
