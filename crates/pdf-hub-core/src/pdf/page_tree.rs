//! Page-tree helpers shared by the merge and optimize pipelines.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Clone a page dictionary with all inheritable attributes made explicit.
pub fn materialize_page(doc: &Document, page_id: ObjectId) -> lopdf::Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(page)
}

/// Follow a reference (if any) to a dictionary.
pub fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Read a PDF number (integer or real).
#[allow(clippy::cast_precision_loss)]
pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Page width and height in points, from the (inherited) MediaBox.
///
/// Falls back to US Letter when the box is missing or malformed.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = materialize_page(doc, page_id).ok().and_then(|page| {
        let object = page.get(b"MediaBox").ok()?.clone();
        let array = match object {
            Object::Array(array) => array,
            Object::Reference(id) => doc.get_object(id).ok()?.as_array().ok()?.clone(),
            _ => return None,
        };
        let values: Vec<f32> = array.iter().filter_map(number).collect();
        (values.len() == 4).then(|| {
            (
                (values[2] - values[0]).abs(),
                (values[3] - values[1]).abs(),
            )
        })
    });

    media_box.unwrap_or((612.0, 792.0))
}
