//! Tool catalog
//!
//! The five operations a request can select, addressed by their URL slug.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Operation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    ImageToPdf,
    MergePdf,
    SplitPdf,
    RotatePdf,
    ProtectPdf,
}

/// What kind of upload a tool consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Pdf,
    Image,
}

/// Display metadata for a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Value for the file input's `accept` attribute
    pub accepted_types: &'static str,
    /// Short label of the accepted formats ("JPG, PNG" / "PDF")
    pub accepted_label: &'static str,
    pub accepts_multiple: bool,
    pub button_label: &'static str,
    pub input_kind: InputKind,
}

impl Tool {
    const ALL: [Tool; 5] = [
        Tool::ImageToPdf,
        Tool::MergePdf,
        Tool::SplitPdf,
        Tool::RotatePdf,
        Tool::ProtectPdf,
    ];

    /// All tools in display order
    pub fn all() -> &'static [Tool] {
        &Self::ALL
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Tool::ImageToPdf => "image-to-pdf",
            Tool::MergePdf => "merge-pdf",
            Tool::SplitPdf => "split-pdf",
            Tool::RotatePdf => "rotate-pdf",
            Tool::ProtectPdf => "protect-pdf",
        }
    }

    /// Filename offered in the response's Content-Disposition header
    pub fn output_filename(&self) -> &'static str {
        match self {
            Tool::ImageToPdf => "converted.pdf",
            Tool::MergePdf => "merged.pdf",
            Tool::SplitPdf => "extracted.pdf",
            Tool::RotatePdf => "rotated.pdf",
            Tool::ProtectPdf => "protected.pdf",
        }
    }

    pub fn input_kind(&self) -> InputKind {
        match self {
            Tool::ImageToPdf => InputKind::Image,
            _ => InputKind::Pdf,
        }
    }

    /// Merge and image conversion take several files; everything else takes one
    pub fn accepts_multiple(&self) -> bool {
        matches!(self, Tool::MergePdf | Tool::ImageToPdf)
    }

    pub fn info(&self) -> ToolInfo {
        let (title, description, button_label) = match self {
            Tool::ImageToPdf => (
                "Image to PDF",
                "Convert JPG and PNG images to PDF securely in your browser.",
                "Convert to PDF",
            ),
            Tool::MergePdf => (
                "Merge PDF",
                "Combine multiple PDFs into one unified document.",
                "Merge PDFs",
            ),
            Tool::SplitPdf => (
                "Split PDF",
                "Extract specific pages from a PDF document.",
                "Split PDF",
            ),
            Tool::RotatePdf => (
                "Rotate PDF",
                "Rotate specific pages or the entire document permanently.",
                "Rotate PDF",
            ),
            Tool::ProtectPdf => (
                "Protect PDF",
                "Encrypt your PDF with a secure password.",
                "Protect PDF",
            ),
        };

        let (accepted_types, accepted_label) = match self.input_kind() {
            InputKind::Image => ("image/*", "JPG, PNG"),
            InputKind::Pdf => (".pdf", "PDF"),
        };

        ToolInfo {
            slug: self.slug(),
            title,
            description,
            accepted_types,
            accepted_label,
            accepts_multiple: self.accepts_multiple(),
            button_label,
            input_kind: self.input_kind(),
        }
    }
}

impl FromStr for Tool {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::all()
            .iter()
            .copied()
            .find(|tool| tool.slug() == s.trim())
            .ok_or_else(|| ConvertError::UnsupportedTool(s.to_string()))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
