//! PDF Split algorithm
//!
//! Extracts the selected pages of a PDF into a new document.

use crate::error::ConvertError;
use crate::{resolve_pages, save_document, PageSelection, PdfOutput};
use lopdf::Document;
use std::collections::HashSet;
use tracing::debug;

/// Split a PDF, extracting only the specified pages (1-indexed)
///
/// Page numbers outside the document are ignored; if none of the requested
/// pages exist the split is rejected. Pages keep their original order.
pub fn split_document(bytes: &[u8], selection: &PageSelection) -> Result<PdfOutput, ConvertError> {
    if selection.is_empty() {
        return Err(ConvertError::InvalidRange("No pages specified".into()));
    }

    let doc = Document::load_mem(bytes).map_err(|e| ConvertError::ParseError(e.to_string()))?;

    let page_count = doc.get_pages().len() as u32;
    let pages_to_keep: HashSet<u32> = resolve_pages(selection, page_count)?.into_iter().collect();

    let mut new_doc = doc;

    // Delete in reverse so earlier page numbers stay valid
    let pages_to_delete: Vec<u32> = (1..=page_count)
        .rev()
        .filter(|p| !pages_to_keep.contains(p))
        .collect();
    debug!(
        "Keeping {} of {} pages",
        pages_to_keep.len(),
        page_count
    );
    for page_num in pages_to_delete {
        new_doc.delete_pages(&[page_num]);
    }

    new_doc.prune_objects();
    new_doc.compress();

    save_document(&mut new_doc, pages_to_keep.len() as u32)
}
