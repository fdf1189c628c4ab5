//! Page tree helpers shared by merge and rotate

use lopdf::{Document, Object, ObjectId};

use crate::error::ConvertError;

/// Page attributes a page may inherit from its ancestors (PDF 32000 §7.7.3.4)
pub(crate) const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed trees whose Parent chain loops
const MAX_DEPTH: usize = 64;

/// Look up `key` on the page, falling back to the nearest ancestor that sets it
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;

    for _ in 0..MAX_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }

    None
}

/// Copy every inherited attribute onto the page itself
///
/// After this the page renders the same regardless of which node it hangs under.
pub(crate) fn materialize_inherited(
    doc: &mut Document,
    page_id: ObjectId,
) -> Result<(), ConvertError> {
    let mut resolved = Vec::new();
    for key in INHERITABLE {
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            resolved.push((key, value));
        }
    }

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| ConvertError::OperationError(format!("Invalid page object: {}", e)))?;
    for (key, value) in resolved {
        if !page.has(key) {
            page.set(key, value);
        }
    }

    Ok(())
}

/// Object id of the root Pages node
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId, ConvertError> {
    let catalog = doc
        .catalog()
        .map_err(|e| ConvertError::OperationError(format!("Catalog not found: {}", e)))?;

    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| ConvertError::OperationError("Pages is not a reference".into()))
}

/// Effective rotation of a page in degrees, normalized to 0..360
pub(crate) fn effective_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| match obj {
            Object::Integer(i) => Some(i),
            Object::Real(r) => Some(r as i64),
            _ => None,
        })
        .unwrap_or(0)
        .rem_euclid(360)
}
