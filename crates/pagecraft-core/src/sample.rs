//! Sample document generation
//!
//! Produces small, valid documents whose pages each carry a text label
//! (`"<label> page <n>"`), used as the sample input hook and by tests to
//! tell pages apart after they have been copied around.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

use crate::builder::InfoField;
use crate::error::{PageCraftError, Result};

pub fn sample_document(label: &str, page_count: u32) -> Result<Vec<u8>> {
    sample_document_with_info(label, page_count, &[])
}

/// Like [`sample_document`], with Info dictionary entries set.
pub fn sample_document_with_info(
    label: &str,
    page_count: u32,
    info: &[(InfoField, &str)],
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for i in 0..page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(24)],
                ),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{} page {}", label, i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PageCraftError::OperationError(format!("Encode failed: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    // MediaBox and Resources live on the Pages node and are inherited.
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]);
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_count as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if !info.is_empty() {
        let info_id = doc.add_object(Dictionary::from_iter(
            info.iter()
                .map(|(field, value)| (field.key(), Object::string_literal(*value))),
        ));
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PageCraftError::OperationError(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

/// Read back the label of the page at 0-based `index`, if it has one.
pub fn page_label(doc: &Document, index: u32) -> Option<String> {
    let page_id = *doc.get_pages().get(&(index + 1))?;
    let data = doc.get_page_content(page_id).ok()?;
    let content = Content::decode(&data).ok()?;
    content
        .operations
        .iter()
        .find(|op| op.operator == "Tj")
        .and_then(|op| op.operands.first())
        .and_then(|operand| operand.as_str().ok())
        .map(|text| String::from_utf8_lossy(text).into_owned())
}
