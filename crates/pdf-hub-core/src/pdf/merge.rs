//! Page-preserving concatenation of PDF documents.

use bytes::Bytes;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::page_tree::materialize_page;
use crate::error::MergeError;

/// Concatenates PDF buffers into one document.
///
/// Implementations must keep every page of every input, in input order, and
/// must not return partial output on failure.
pub trait MergeEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str {
        "merge"
    }

    fn merge(&self, inputs: &[Bytes]) -> Result<Vec<u8>, MergeError>;
}

/// Merge engine backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfMerger {
    /// Flate-compress streams in the output
    pub compress: bool,
}

impl LopdfMerger {
    pub const fn new() -> Self {
        Self { compress: true }
    }
}

impl MergeEngine for LopdfMerger {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn merge(&self, inputs: &[Bytes]) -> Result<Vec<u8>, MergeError> {
        merge_documents(inputs, self.compress)
    }
}

/// Merge `inputs` into a single PDF, pages in input order.
///
/// Every input is renumbered into its own object-id range, its pages get
/// their inherited attributes copied in, and all non-structural objects are
/// carried over. A fresh page tree and catalog tie the pages together.
pub fn merge_documents(inputs: &[Bytes], compress: bool) -> Result<Vec<u8>, MergeError> {
    if inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }

    let mut max_id: u32 = 1;
    let mut version = String::from("1.5");
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut merged = Document::with_version("1.5");

    for (i, input) in inputs.iter().enumerate() {
        let position = i + 1;
        let mut doc = Document::load_mem(input).map_err(|e| MergeError::InvalidInput {
            position,
            reason: e.to_string(),
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        if doc.version > version {
            version.clone_from(&doc.version);
        }

        // get_pages is keyed by page number, so this is document order
        let source_pages = doc.get_pages();
        debug!("Input {} has {} pages", position, source_pages.len());

        // get_pages skips Kids it cannot resolve
        if let Some(declared) = declared_page_count(&doc)
            && declared != source_pages.len()
        {
            return Err(MergeError::InvalidPage {
                position,
                reason: format!(
                    "page tree declares {declared} pages but only {} are readable",
                    source_pages.len()
                ),
            });
        }

        for &page_id in source_pages.values() {
            let page = materialize_page(&doc, page_id).map_err(|e| MergeError::InvalidPage {
                position,
                reason: e.to_string(),
            })?;
            pages.push((page_id, page));
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    merged.objects.insert(object_id, object);
                }
            }
        }
    }

    merged.version = version;
    merged.max_id = max_id;

    let pages_id = merged.new_object_id();

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let page_count = i64::try_from(pages.len()).map_err(|e| MergeError::Save(e.to_string()))?;

    for (page_id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        merged.objects.insert(page_id, Object::Dictionary(page));
    }

    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_count)),
    ]);
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = merged.new_object_id();
    let catalog = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.renumber_objects();
    if compress {
        merged.compress();
    }

    let mut output = Vec::new();
    merged
        .save_to(&mut output)
        .map_err(|e| MergeError::Save(e.to_string()))?;

    debug!(
        "Merged {} inputs into {} pages ({} bytes)",
        inputs.len(),
        page_count,
        output.len()
    );

    Ok(output)
}

/// `/Count` of the root page tree node, when present and sane.
fn declared_page_count(doc: &Document) -> Option<usize> {
    let pages_id = doc.catalog().ok()?.get(b"Pages").ok()?.as_reference().ok()?;
    let count = doc.get_dictionary(pages_id).ok()?.get(b"Count").ok()?.as_i64().ok()?;
    usize::try_from(count).ok()
}
