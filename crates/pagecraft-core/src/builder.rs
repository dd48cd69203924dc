//! Document builder collaborator
//!
//! The composition pipelines never mutate a source document. They create an
//! empty output document, copy the pages they need into it and serialize
//! the result. [`DocumentBuilder`] is that seam; [`LopdfBuilder`] implements
//! it on top of lopdf.
//!
//! Copying a page imports only the objects reachable from it (contents,
//! resources, annotations), never the source's page tree, catalog or Info
//! dictionary. Attributes a page inherits from its ancestors are resolved
//! onto the copy before the parent link is cut.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PageCraftError, Result};
use crate::page_model::Rotation;

/// Document-level Info fields the pipelines can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InfoField {
    Title,
    Author,
    Subject,
    Keywords,
    Creator,
    Producer,
}

impl InfoField {
    pub const ALL: [InfoField; 6] = [
        InfoField::Title,
        InfoField::Author,
        InfoField::Subject,
        InfoField::Keywords,
        InfoField::Creator,
        InfoField::Producer,
    ];

    pub fn key(self) -> &'static str {
        match self {
            InfoField::Title => "Title",
            InfoField::Author => "Author",
            InfoField::Subject => "Subject",
            InfoField::Keywords => "Keywords",
            InfoField::Creator => "Creator",
            InfoField::Producer => "Producer",
        }
    }
}

/// Creates and loads documents.
pub trait DocumentBuilder {
    type Document: BuiltDocument;

    /// A new document with no pages.
    fn create(&self) -> Self::Document;

    /// Parse `bytes`, consuming them. Encrypted documents are loaded as-is.
    fn load(&self, bytes: Vec<u8>) -> Result<Self::Document>;
}

/// A document that pages can be copied from and into.
pub trait BuiltDocument: Sized {
    type PageRef;

    fn page_count(&self) -> u32;

    /// 0-based indices of every page, in document order.
    fn page_indices(&self) -> Vec<u32> {
        (0..self.page_count()).collect()
    }

    /// Import the pages at `indices` from `source` without attaching them.
    /// The returned refs follow the order of `indices`.
    fn copy_pages(&mut self, source: &Self, indices: &[u32]) -> Result<Vec<Self::PageRef>>;

    /// Append a copied page to the end of this document.
    fn add_page(&mut self, page: &Self::PageRef) -> Result<()>;

    /// Overwrite the page's rotation with an absolute value.
    fn set_page_rotation(&mut self, page: &Self::PageRef, rotation: Rotation) -> Result<()>;

    fn set_info(&mut self, field: InfoField, value: &str);

    fn info(&self, field: InfoField) -> Option<String>;

    fn save(&mut self) -> Result<Vec<u8>>;
}

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBuilder;

impl LopdfBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBuilder for LopdfBuilder {
    type Document = LopdfDocument;

    fn create(&self) -> LopdfDocument {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(Vec::new())),
                ("Count", Object::Integer(0)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        LopdfDocument {
            doc,
            pages_id,
            kids: Vec::new(),
            info: BTreeMap::new(),
        }
    }

    fn load(&self, bytes: Vec<u8>) -> Result<LopdfDocument> {
        let doc =
            Document::load_mem(&bytes).map_err(|e| PageCraftError::ParseError(e.to_string()))?;
        if doc.is_encrypted() {
            warn!("document is encrypted; loading without decryption");
        }
        let pages_id = pages_root(&doc)?;
        let kids = doc.get_pages().into_values().collect();

        Ok(LopdfDocument {
            doc,
            pages_id,
            kids,
            info: BTreeMap::new(),
        })
    }
}

/// A lopdf document plus the bookkeeping needed to append pages to it.
#[derive(Debug)]
pub struct LopdfDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    info: BTreeMap<InfoField, String>,
}

impl LopdfDocument {
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn version(&self) -> &str {
        &self.doc.version
    }

    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Rewrite the root Kids/Count to the flat list of appended pages.
    fn sync_page_tree(&mut self) -> Result<()> {
        for kid in &self.kids {
            self.doc
                .get_dictionary_mut(*kid)
                .map_err(|e| PageCraftError::OperationError(format!("Invalid page: {}", e)))?
                .set("Parent", Object::Reference(self.pages_id));
        }

        let pages = self.doc.get_dictionary_mut(self.pages_id).map_err(|_| {
            PageCraftError::OperationError("Invalid pages dictionary".into())
        })?;
        pages.set(
            "Kids",
            Object::Array(self.kids.iter().map(|&id| Object::Reference(id)).collect()),
        );
        pages.set("Count", Object::Integer(self.kids.len() as i64));
        Ok(())
    }

    /// Write pending Info fields into the trailer's Info dictionary,
    /// creating it only if the document has none yet.
    fn write_info(&mut self) -> Result<()> {
        if self.info.is_empty() {
            return Ok(());
        }

        let existing = self
            .doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .ok()
            .filter(|&id| self.doc.get_dictionary(id).is_ok());
        let info_id = match existing {
            Some(id) => id,
            None => {
                let id = self.doc.add_object(Dictionary::new());
                self.doc.trailer.set("Info", Object::Reference(id));
                id
            }
        };

        let info = self
            .doc
            .get_dictionary_mut(info_id)
            .map_err(|e| PageCraftError::OperationError(format!("Invalid Info: {}", e)))?;
        for (field, value) in &self.info {
            info.set(field.key(), Object::string_literal(value.as_str()));
        }
        Ok(())
    }

    fn source_info(&self, field: InfoField) -> Option<String> {
        let info_id = self.doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
        let value = self.doc.get_dictionary(info_id).ok()?.get(field.key().as_bytes()).ok()?;
        value
            .as_str()
            .ok()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl BuiltDocument for LopdfDocument {
    type PageRef = ObjectId;

    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn copy_pages(&mut self, source: &Self, indices: &[u32]) -> Result<Vec<ObjectId>> {
        let source_pages = source.doc.get_pages();
        let page_count = source_pages.len() as u32;

        let page_ids = indices
            .iter()
            .map(|&index| {
                source_pages
                    .get(&(index + 1))
                    .copied()
                    .ok_or(PageCraftError::PageNotFound { index, page_count })
            })
            .collect::<Result<Vec<_>>>()?;
        let wanted: BTreeSet<ObjectId> = page_ids.iter().copied().collect();

        let mut flattened = BTreeMap::new();
        for &id in &wanted {
            flattened.insert(id, flatten_page(&source.doc, id)?);
        }

        // Everything reachable from the copied pages, minus page tree nodes.
        let mut reachable = BTreeSet::new();
        let mut pending = Vec::new();
        for page in flattened.values() {
            push_dictionary_refs(page, &mut pending);
        }
        while let Some(id) = pending.pop() {
            if wanted.contains(&id) || reachable.contains(&id) {
                continue;
            }
            let Ok(object) = source.doc.get_object(id) else {
                continue;
            };
            if is_tree_node(object) {
                continue;
            }
            reachable.insert(id);
            push_refs(object, &mut pending);
        }

        let mut mapping = BTreeMap::new();
        for &id in wanted.iter().chain(reachable.iter()) {
            mapping.insert(id, self.doc.new_object_id());
        }

        for &id in &reachable {
            if let Ok(object) = source.doc.get_object(id) {
                self.doc
                    .objects
                    .insert(mapping[&id], remap_refs(object.clone(), &mapping));
            }
        }
        for (id, page) in flattened {
            let mut page = remap_refs(Object::Dictionary(page), &mapping);
            if let Object::Dictionary(ref mut dict) = page {
                dict.set("Parent", Object::Reference(self.pages_id));
            }
            self.doc.objects.insert(mapping[&id], page);
        }

        debug!(
            pages = page_ids.len(),
            objects = mapping.len(),
            "copied pages"
        );
        Ok(page_ids.iter().map(|id| mapping[id]).collect())
    }

    fn add_page(&mut self, page: &ObjectId) -> Result<()> {
        self.kids.push(*page);
        self.sync_page_tree()
    }

    fn set_page_rotation(&mut self, page: &ObjectId, rotation: Rotation) -> Result<()> {
        self.doc
            .get_dictionary_mut(*page)
            .map_err(|e| PageCraftError::OperationError(format!("Invalid page: {}", e)))?
            .set("Rotate", Object::Integer(i64::from(rotation.degrees())));
        Ok(())
    }

    fn set_info(&mut self, field: InfoField, value: &str) {
        self.info.insert(field, value.to_string());
    }

    fn info(&self, field: InfoField) -> Option<String> {
        self.info
            .get(&field)
            .cloned()
            .or_else(|| self.source_info(field))
    }

    fn save(&mut self) -> Result<Vec<u8>> {
        self.write_info()?;
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PageCraftError::OperationError(format!("Save failed: {}", e)))?;
        Ok(buffer)
    }
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PageCraftError::ParseError("No Root in trailer".into()))?;
    doc.get_dictionary(catalog_id)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| PageCraftError::ParseError("No Pages in catalog".into()))
}

/// Clone a page dictionary with inherited attributes resolved and the
/// parent link removed.
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|e| PageCraftError::ParseError(format!("Invalid page object: {}", e)))?
        .clone();

    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, &page, key) {
            page.set(key.to_vec(), value);
        }
    }
    page.remove(b"Parent");
    Ok(page)
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn is_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages") | Ok(b"Catalog")
    )
}

fn push_refs(object: &Object, pending: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => pending.push(*id),
        Object::Array(items) => items.iter().for_each(|item| push_refs(item, pending)),
        Object::Dictionary(dict) => push_dictionary_refs(dict, pending),
        Object::Stream(stream) => push_dictionary_refs(&stream.dict, pending),
        _ => {}
    }
}

fn push_dictionary_refs(dict: &Dictionary, pending: &mut Vec<ObjectId>) {
    for (_, value) in dict.iter() {
        push_refs(value, pending);
    }
}

/// Rewrite references through `mapping`; references to objects that were
/// not copied become null.
fn remap_refs(object: Object, mapping: &BTreeMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => match mapping.get(&id) {
            Some(&new_id) => Object::Reference(new_id),
            None => Object::Null,
        },
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| remap_refs(item, mapping))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), mapping);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), mapping);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{page_label, sample_document};
    use pretty_assertions::assert_eq;

    fn load(bytes: Vec<u8>) -> LopdfDocument {
        LopdfBuilder.load(bytes).unwrap()
    }

    #[test]
    fn test_create_is_empty() {
        let doc = LopdfBuilder.create();
        assert_eq!(doc.page_count(), 0);
        assert!(doc.page_indices().is_empty());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let result = LopdfBuilder.load(b"%PDF-1.7 but nothing else".to_vec());
        assert!(matches!(result, Err(PageCraftError::ParseError(_))));
    }

    #[test]
    fn test_copy_pages_keeps_requested_order() {
        let source = load(sample_document("Doc", 3).unwrap());
        let mut out = LopdfBuilder.create();
        let refs = out.copy_pages(&source, &[2, 0]).unwrap();
        for page in &refs {
            out.add_page(page).unwrap();
        }

        let saved = load(out.save().unwrap());
        assert_eq!(page_label(saved.document(), 0), Some("Doc page 3".to_string()));
        assert_eq!(page_label(saved.document(), 1), Some("Doc page 1".to_string()));
    }

    #[test]
    fn test_copy_resolves_inherited_attributes() {
        // Sample documents keep MediaBox and Resources on the Pages node.
        let source = load(sample_document("Doc", 2).unwrap());
        let mut out = LopdfBuilder.create();
        let refs = out.copy_pages(&source, &[1]).unwrap();
        out.add_page(&refs[0]).unwrap();

        let saved = load(out.save().unwrap());
        let page_id = saved.document().get_pages()[&1];
        let page = saved.document().get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn test_copy_rejects_missing_page() {
        let source = load(sample_document("Doc", 2).unwrap());
        let mut out = LopdfBuilder.create();
        assert!(matches!(
            out.copy_pages(&source, &[5]),
            Err(PageCraftError::PageNotFound {
                index: 5,
                page_count: 2
            })
        ));
    }

    #[test]
    fn test_copy_does_not_pull_source_info() {
        let source = load(
            crate::sample::sample_document_with_info("Doc", 1, &[(InfoField::Title, "Secret")])
                .unwrap(),
        );
        assert_eq!(source.info(InfoField::Title), Some("Secret".to_string()));

        let mut out = LopdfBuilder.create();
        let refs = out.copy_pages(&source, &[0]).unwrap();
        out.add_page(&refs[0]).unwrap();
        let saved = load(out.save().unwrap());
        assert_eq!(saved.info(InfoField::Title), None);
    }

    #[test]
    fn test_rotation_overwrites() {
        let source = load(sample_document("Doc", 1).unwrap());
        let mut out = LopdfBuilder.create();
        let refs = out.copy_pages(&source, &[0]).unwrap();
        out.add_page(&refs[0]).unwrap();
        out.set_page_rotation(&refs[0], Rotation::R90).unwrap();
        out.set_page_rotation(&refs[0], Rotation::R180).unwrap();

        let saved = load(out.save().unwrap());
        let page_id = saved.document().get_pages()[&1];
        let rotate = saved
            .document()
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Rotate")
            .unwrap()
            .as_i64()
            .unwrap();
        assert_eq!(rotate, 180);
    }

    #[test]
    fn test_info_fields_round_trip_through_save() {
        let mut out = LopdfBuilder.create();
        out.set_info(InfoField::Title, "");
        out.set_info(InfoField::Producer, "pagecraft");
        let saved = load(out.save().unwrap());
        assert_eq!(saved.info(InfoField::Title), Some(String::new()));
        assert_eq!(saved.info(InfoField::Producer), Some("pagecraft".to_string()));
        assert_eq!(saved.info(InfoField::Author), None);
    }

    #[test]
    fn test_repeated_save_reuses_info_dictionary() {
        let mut out = LopdfBuilder.create();
        out.set_info(InfoField::Producer, "pagecraft");
        let first = Document::load_mem(&out.save().unwrap()).unwrap();

        out.set_info(InfoField::Title, "Second");
        let second_bytes = out.save().unwrap();
        let second = Document::load_mem(&second_bytes).unwrap();

        assert_eq!(second.objects.len(), first.objects.len());
        let saved = load(second_bytes);
        assert_eq!(saved.info(InfoField::Title), Some("Second".to_string()));
        assert_eq!(saved.info(InfoField::Producer), Some("pagecraft".to_string()));
    }
}
