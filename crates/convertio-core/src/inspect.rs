//! PDF validation and info extraction

use lopdf::{Dictionary, Document};
use serde::Serialize;

use crate::error::ConvertError;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// Whether the document is encrypted
    pub encrypted: bool,
    /// File size in bytes
    pub size_bytes: usize,
    pub valid: bool,
    /// Document title from metadata (if available)
    pub title: Option<String>,
    /// Document author from metadata (if available)
    pub author: Option<String>,
}

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, ConvertError> {
    let doc = Document::load_mem(bytes).map_err(|e| ConvertError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, ConvertError> {
    check_header(bytes)?;

    let version = extract_version(bytes);
    let document =
        Document::load_mem(bytes).map_err(|e| ConvertError::ParseError(e.to_string()))?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err(ConvertError::ParseError("PDF has no pages".into()));
    }

    let (title, author) = extract_metadata(&document);

    Ok(PdfInfo {
        page_count,
        version,
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        valid: true,
        title,
        author,
    })
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), ConvertError> {
    check_header(bytes)?;

    // %%EOF should sit near the end
    let tail = if bytes.len() > 1024 {
        &bytes[bytes.len() - 1024..]
    } else {
        bytes
    };

    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(ConvertError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".into(),
        ));
    }

    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), ConvertError> {
    if bytes.len() < 8 {
        return Err(ConvertError::WrongFileType(
            "File too small to be a valid PDF".into(),
        ));
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(ConvertError::WrongFileType(
            "Not a valid PDF file (missing %PDF- header)".into(),
        ));
    }

    Ok(())
}

/// Header format: %PDF-1.7
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

/// Title and author from the trailer's Info dictionary
fn extract_metadata(document: &Document) -> (Option<String>, Option<String>) {
    let info = document
        .trailer
        .get(b"Info")
        .and_then(|obj| obj.as_reference())
        .and_then(|id| document.get_dictionary(id));

    match info {
        Ok(dict) => (text_entry(dict, b"Title"), text_entry(dict, b"Author")),
        Err(_) => (None, None),
    }
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).and_then(|obj| obj.as_str()).ok()?;
    let decoded = String::from_utf8_lossy(bytes);
    (!decoded.is_empty()).then(|| decoded.into_owned())
}
