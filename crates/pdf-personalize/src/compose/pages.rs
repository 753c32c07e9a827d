//! Page copying between documents
//!
//! Pages are copied with every object they reference. Attributes a page
//! inherits from its page tree are materialised on the copy so geometry and
//! resources survive outside the source tree.

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeSet, HashMap};

/// Page attributes that may be inherited from ancestor `Pages` nodes
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic `Parent` chains
const MAX_TREE_DEPTH: usize = 64;

// =============================================================================
// Deep Copy
// =============================================================================

/// Copies pages from one source document into an output document.
///
/// Object ids are remapped once, so shared resources are copied a single
/// time and reference cycles terminate. References to source pages that are
/// not being copied become `null`, which keeps discarded pages (and the rest
/// of the source page tree) out of the output.
pub(crate) struct PageCopier<'a> {
    source: &'a Document,
    mapped: HashMap<ObjectId, ObjectId>,
    source_pages: BTreeSet<ObjectId>,
}

impl<'a> PageCopier<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self {
            source,
            mapped: HashMap::new(),
            source_pages: source.get_pages().values().copied().collect(),
        }
    }

    /// Assign output ids to pages up front so links between them resolve
    pub fn reserve_pages(&mut self, output: &mut Document, page_ids: &[ObjectId]) {
        for &id in page_ids {
            self.reserve(output, id);
        }
    }

    /// Copy one page and attach it to `parent_id` in the output
    pub fn copy_page(
        &mut self,
        output: &mut Document,
        page_id: ObjectId,
        parent_id: ObjectId,
    ) -> Result<ObjectId> {
        let source = self.source;
        let new_id = self.reserve(output, page_id);
        let page = source.get_dictionary(page_id)?;

        let mut dict = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            dict.set(key.clone(), self.copy_object(output, value)?);
        }

        for key in INHERITABLE_KEYS {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                dict.set(key, self.copy_object(output, &value)?);
            }
        }

        dict.set("Parent", Object::Reference(parent_id));
        output.objects.insert(new_id, Object::Dictionary(dict));
        Ok(new_id)
    }

    fn reserve(&mut self, output: &mut Document, id: ObjectId) -> ObjectId {
        *self
            .mapped
            .entry(id)
            .or_insert_with(|| output.new_object_id())
    }

    /// Deep copy an object from source to output document, following references.
    pub fn copy_object(&mut self, output: &mut Document, obj: &Object) -> Result<Object> {
        match obj {
            Object::Reference(id) => {
                if let Some(&new_id) = self.mapped.get(id) {
                    return Ok(Object::Reference(new_id));
                }
                if self.source_pages.contains(id) {
                    return Ok(Object::Null);
                }
                // Dangling references read as null
                let source = self.source;
                let Ok(referenced) = source.get_object(*id) else {
                    return Ok(Object::Null);
                };

                // Map before recursing so cycles land on the reserved id
                let new_id = output.new_object_id();
                self.mapped.insert(*id, new_id);
                let copied = self.copy_object(output, referenced)?;
                output.objects.insert(new_id, copied);

                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(output, dict)?)),
            Object::Array(arr) => {
                let new_arr: Result<Vec<_>> = arr
                    .iter()
                    .map(|item| self.copy_object(output, item))
                    .collect();
                Ok(Object::Array(new_arr?))
            }
            Object::Stream(stream) => Ok(Object::Stream(Stream {
                dict: self.copy_dictionary(output, &stream.dict)?,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: None,
            })),
            // Primitive types: just clone
            _ => Ok(obj.clone()),
        }
    }

    fn copy_dictionary(&mut self, output: &mut Document, dict: &Dictionary) -> Result<Dictionary> {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            new_dict.set(key.clone(), self.copy_object(output, value)?);
        }
        Ok(new_dict)
    }
}

/// Look up `key` on a page or the nearest ancestor that defines it
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

// =============================================================================
// Page Geometry
// =============================================================================

/// A page's MediaBox in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PageBox {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: DEFAULT_PAGE_DIMENSIONS.0,
            height: DEFAULT_PAGE_DIMENSIONS.1,
        }
    }
}

/// Get a page's (possibly inherited) MediaBox, US Letter if absent or malformed
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let Some(media_box) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return PageBox::default();
    };
    let media_box = match media_box {
        Object::Reference(id) => match doc.get_object(id) {
            Ok(obj) => obj.clone(),
            Err(_) => return PageBox::default(),
        },
        obj => obj,
    };
    let Ok(values) = media_box.as_array() else {
        return PageBox::default();
    };
    let numbers: Vec<f32> = values.iter().filter_map(extract_number).collect();
    if numbers.len() != 4 {
        return PageBox::default();
    }

    let (x0, x1) = (numbers[0].min(numbers[2]), numbers[0].max(numbers[2]));
    let (y0, y1) = (numbers[1].min(numbers[3]), numbers[1].max(numbers[3]));
    PageBox {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    }
}

/// Get page dimensions (width, height) in points
pub fn get_page_dimensions(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let page = page_box(doc, page_id);
    (page.width, page.height)
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

// =============================================================================
// Document Assembly
// =============================================================================

/// Write the page tree and catalog, making `kids` the document's pages in order
pub(crate) fn finish_document(output: &mut Document, pages_id: ObjectId, kids: Vec<ObjectId>) {
    let count = kids.len() as i64;
    let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    output.trailer.set("Root", catalog_id);
}
