//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document, pages in upload order.

use crate::error::ConvertError;
use crate::page_tree::{materialize_inherited, root_pages_id};
use crate::{save_document, PdfOutput};
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. Load every document, the first one becomes the destination
/// 3. For each source document:
///    a. Copy inherited page attributes onto its pages
///    b. Import all objects with IDs shifted past the destination's max ID
///    c. Re-parent its pages under the destination's root Pages node
/// 4. Rebuild the root Kids array, prune the orphaned page tree nodes,
///    compress and serialize
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<PdfOutput, ConvertError> {
    if documents.is_empty() {
        return Err(ConvertError::OperationError("No documents to merge".into()));
    }

    let mut loaded_docs = Vec::with_capacity(documents.len());
    for (i, doc_bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(doc_bytes).map_err(|e| {
            ConvertError::ParseError(format!("Failed to load document {}: {}", i, e))
        })?;
        loaded_docs.push(doc);
    }

    let mut dest = loaded_docs.remove(0);
    if loaded_docs.is_empty() {
        debug!("Single document merge, re-serializing");
        let page_count = dest.get_pages().len() as u32;
        return save(dest, page_count);
    }

    let dest_pages_id = root_pages_id(&dest)?;
    let mut dest_max_id = dest.max_id;

    let mut page_refs = page_references(&dest);
    for &page_id in &page_refs {
        materialize_inherited(&mut dest, page_id)?;
    }

    for (i, mut source) in loaded_docs.into_iter().enumerate() {
        let source_pages = page_references(&source);
        for &page_id in &source_pages {
            materialize_inherited(&mut source, page_id)?;
        }

        let id_offset = dest_max_id;
        debug!(
            "Importing document {} ({} pages) at id offset {}",
            i + 1,
            source_pages.len(),
            id_offset
        );

        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            dest.objects
                .insert(new_id, remap_object_refs(object, id_offset));
        }

        page_refs.extend(
            source_pages
                .into_iter()
                .map(|(num, gen)| (num + id_offset, gen)),
        );

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }

    dest.max_id = dest_max_id;
    update_page_tree(&mut dest, dest_pages_id, &page_refs)?;
    dest.prune_objects();

    save(dest, page_refs.len() as u32)
}

fn save(mut doc: Document, page_count: u32) -> Result<PdfOutput, ConvertError> {
    doc.compress();
    save_document(&mut doc, page_count)
}

/// All page object references in page order
fn page_references(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Recursively shift object references by `offset`
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the root Pages node at `page_refs` and every page back at the root
fn update_page_tree(
    doc: &mut Document,
    pages_id: ObjectId,
    page_refs: &[ObjectId],
) -> Result<(), ConvertError> {
    for &page_id in page_refs {
        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|e| ConvertError::OperationError(format!("Invalid page object: {}", e)))?;
        page.set("Parent", Object::Reference(pages_id));
    }

    let pages_dict = doc
        .get_dictionary_mut(pages_id)
        .map_err(|_| ConvertError::OperationError("Invalid pages dictionary".into()))?;

    let kids = page_refs
        .iter()
        .map(|&id| Object::Reference(id))
        .collect::<Vec<_>>();
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_refs.len() as i64));

    Ok(())
}
