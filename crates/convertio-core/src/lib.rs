//! ConvertIO document operations
//!
//! Merge, split, rotate, password-protect and image-to-PDF, each a single pass
//! over `lopdf`. The server and the WASM bindings both dispatch through
//! [`run_tool`].

pub mod command;
pub mod error;
pub mod images;
pub mod inspect;
pub mod merge;
mod page_tree;
pub mod protect;
pub mod rotate;
pub mod split;
pub mod tool;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{
    run_tool, run_tool_with_metrics, validate_files, ProcessMetrics, ProcessResult, ToolOutput,
    ToolParams, ToolRequest, UploadedFile, PDF_MIME,
};
pub use error::ConvertError;
pub use images::{images_to_pdf, ImageSource};
pub use inspect::{get_page_count, quick_validate, validate_pdf, PdfInfo};
pub use merge::merge_documents;
pub use protect::{protect_document, ProtectOptions};
pub use rotate::{rotate_document, Rotation};
pub use split::split_document;
pub use tool::{InputKind, Tool, ToolInfo};

use std::collections::BTreeSet;

use lopdf::Document;

/// A serialized PDF and the number of pages it holds
#[derive(Debug, Clone)]
pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

pub(crate) fn save_document(doc: &mut Document, page_count: u32) -> Result<PdfOutput, ConvertError> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ConvertError::SerializationError(format!("Save failed: {}", e)))?;

    Ok(PdfOutput { bytes, page_count })
}

/// Pages picked by a range string such as "1-3, 5, 8-10"
///
/// Stored as inclusive intervals. Page numbers are only enumerated against
/// the page count of an actual document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    ranges: Vec<(u32, u32)>,
}

impl PageSelection {
    /// Select individual page numbers
    pub fn from_pages(pages: impl IntoIterator<Item = u32>) -> Self {
        Self {
            ranges: pages.into_iter().map(|p| (p, p)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Selected pages that exist in a document of `page_count` pages, ascending and unique
    pub fn pages_within(&self, page_count: u32) -> Vec<u32> {
        let mut pages = BTreeSet::new();
        for &(start, end) in &self.ranges {
            let (start, end) = (start.max(1), end.min(page_count));
            if start <= end {
                pages.extend(start..=end);
            }
        }
        pages.into_iter().collect()
    }
}

/// Parse page range string like "1-3, 5, 8-10"
pub fn parse_ranges(input: &str) -> Result<PageSelection, ConvertError> {
    let mut ranges = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| ConvertError::InvalidRange(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| ConvertError::InvalidRange(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(ConvertError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }

            ranges.push((start, end));
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| ConvertError::InvalidRange(format!("Invalid page: {}", part)))?;
            ranges.push((page, page));
        }
    }

    Ok(PageSelection { ranges })
}

/// Keep only the selected pages that exist in a document of `page_count` pages.
///
/// Out-of-range numbers are dropped; an empty remainder is an error.
pub fn resolve_pages(selection: &PageSelection, page_count: u32) -> Result<Vec<u32>, ConvertError> {
    let pages = selection.pages_within(page_count);

    if pages.is_empty() {
        return Err(ConvertError::InvalidRange("Invalid page numbers".into()));
    }

    Ok(pages)
}
