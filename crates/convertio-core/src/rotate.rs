//! Page rotation
//!
//! Adds a clockwise angle to the `/Rotate` entry of every selected page.

use std::fmt;

use lopdf::{Document, Object};
use tracing::debug;

use crate::error::ConvertError;
use crate::page_tree::effective_rotation;
use crate::{resolve_pages, save_document, PageSelection, PdfOutput};

/// Clockwise rotation, always a multiple of 90 in `0..360`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation(u16);

impl Rotation {
    pub const DEFAULT: Rotation = Rotation(90);

    /// Build from any multiple of 90, negative values rotate counter-clockwise
    pub fn from_degrees(degrees: i64) -> Result<Self, ConvertError> {
        if degrees % 90 != 0 {
            return Err(ConvertError::InvalidRotation(format!(
                "{} is not a multiple of 90",
                degrees
            )));
        }
        Ok(Rotation(degrees.rem_euclid(360) as u16))
    }

    /// Read the optional form value.
    ///
    /// Missing, blank, non-numeric and zero values fall back to 90 degrees.
    pub fn from_param(value: Option<&str>) -> Result<Self, ConvertError> {
        match value.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
            None | Some(0) => Ok(Self::DEFAULT),
            Some(degrees) => Self::from_degrees(degrees),
        }
    }

    pub fn degrees(&self) -> u16 {
        self.0
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Rotate the given pages (1-indexed), or every page when `pages` is `None`
pub fn rotate_document(
    bytes: &[u8],
    rotation: Rotation,
    pages: Option<&PageSelection>,
) -> Result<PdfOutput, ConvertError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| ConvertError::ParseError(e.to_string()))?;

    let all_pages = doc.get_pages();
    let targets = match pages {
        Some(selection) => resolve_pages(selection, all_pages.len() as u32)?,
        None => all_pages.keys().copied().collect(),
    };

    debug!("Rotating {} pages by {}", targets.len(), rotation);

    for page_num in targets {
        let page_id = *all_pages
            .get(&page_num)
            .ok_or_else(|| ConvertError::InvalidRange(format!("Page {} not found", page_num)))?;
        let angle = (effective_rotation(&doc, page_id) + i64::from(rotation.degrees())) % 360;

        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|e| ConvertError::OperationError(format!("Invalid page {}: {}", page_num, e)))?;
        page.set("Rotate", Object::Integer(angle));
    }

    doc.compress();

    save_document(&mut doc, all_pages.len() as u32)
}
