//! Request-scoped inputs and the tool dispatcher

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::error::ConvertError;
use crate::images::{images_to_pdf, ImageSource};
use crate::merge::merge_documents;
use crate::protect::{protect_document, ProtectOptions};
use crate::rotate::{rotate_document, Rotation};
use crate::split::split_document;
use crate::tool::{InputKind, Tool};
use crate::parse_ranges;

/// Media type of every tool's output
pub const PDF_MIME: &str = "application/pdf";

/// An uploaded file: raw bytes plus the declared media type
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    /// Declared as PDF, or carries the PDF header
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_MIME) || self.bytes.starts_with(b"%PDF-")
    }

    /// Declared as `image/*`, or recognizable from its leading bytes
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
            || image::guess_format(&self.bytes).is_ok()
    }
}

/// Operation-specific form parameters
#[derive(Debug, Clone, Default)]
pub struct ToolParams {
    /// Page selection such as "1, 3-5" (split, optional for rotate)
    pub page_range: Option<String>,
    /// Angle in degrees (rotate)
    pub rotation: Option<String>,
    /// Open password (protect)
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub tool: Tool,
    pub files: Vec<UploadedFile>,
    pub params: ToolParams,
}

/// Bytes to send back with their download metadata
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub bytes: Vec<u8>,
    /// Pages in the produced document
    pub page_count: u32,
    pub filename: &'static str,
    pub content_type: &'static str,
}

/// JSON-friendly summary of a run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}

impl ProcessResult {
    pub fn failure(error: &ConvertError) -> Self {
        Self {
            success: false,
            filename: None,
            error: Some(error.to_string()),
            metrics: None,
        }
    }
}

/// Check the uploads against what the tool accepts
pub fn validate_files(tool: Tool, files: &[UploadedFile]) -> Result<(), ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::NoFiles);
    }

    if !tool.accepts_multiple() && files.len() > 1 {
        return Err(ConvertError::TooManyFiles);
    }

    for file in files {
        if file.bytes.is_empty() {
            return Err(ConvertError::EmptyFile(file.name.clone()));
        }

        match tool.input_kind() {
            InputKind::Pdf if !file.is_pdf() => {
                return Err(ConvertError::WrongFileType(
                    "Only PDF files are allowed.".into(),
                ));
            }
            InputKind::Image if !file.is_image() => {
                return Err(ConvertError::WrongFileType(
                    "Only image files (JPG, PNG) are allowed.".into(),
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Validate the request and run the selected operation
pub fn run_tool(request: &ToolRequest) -> Result<ToolOutput, ConvertError> {
    let ToolRequest {
        tool,
        files,
        params,
    } = request;

    validate_files(*tool, files)?;

    let output = match tool {
        Tool::ImageToPdf => {
            let sources: Vec<ImageSource<'_>> = files
                .iter()
                .map(|f| ImageSource {
                    name: &f.name,
                    bytes: &f.bytes,
                })
                .collect();
            images_to_pdf(&sources)?
        }
        Tool::MergePdf => merge_documents(files.iter().map(|f| f.bytes.clone()).collect())?,
        Tool::SplitPdf => {
            let range = params.page_range.as_deref().unwrap_or_default();
            let selection = parse_ranges(range)?;
            split_document(&files[0].bytes, &selection)?
        }
        Tool::RotatePdf => {
            let rotation = Rotation::from_param(params.rotation.as_deref())?;
            let selection = match params.page_range.as_deref().map(str::trim) {
                Some(range) if !range.is_empty() => Some(parse_ranges(range)?),
                _ => None,
            };
            rotate_document(&files[0].bytes, rotation, selection.as_ref())?
        }
        Tool::ProtectPdf => {
            let password = params
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or(ConvertError::MissingPassword)?;
            protect_document(&files[0].bytes, &ProtectOptions::new(password))?
        }
    };

    info!(
        "{} produced {} page(s), {} bytes from {} file(s)",
        tool,
        output.page_count,
        output.bytes.len(),
        files.len()
    );

    Ok(ToolOutput {
        bytes: output.bytes,
        page_count: output.page_count,
        filename: tool.output_filename(),
        content_type: PDF_MIME,
    })
}

/// Run a tool and summarize the outcome with timing
pub fn run_tool_with_metrics(request: &ToolRequest) -> (Result<ToolOutput, ConvertError>, ProcessResult) {
    let start = Instant::now();
    let input_size_bytes = request.files.iter().map(|f| f.bytes.len()).sum();

    let outcome = run_tool(request);
    let summary = match &outcome {
        Ok(output) => ProcessResult {
            success: true,
            filename: Some(output.filename.to_string()),
            error: None,
            metrics: Some(ProcessMetrics {
                input_size_bytes,
                output_size_bytes: output.bytes.len(),
                page_count: output.page_count,
                processing_time_ms: start.elapsed().as_millis() as u64,
            }),
        },
        Err(e) => ProcessResult::failure(e),
    };

    (outcome, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_image, create_test_pdf};
    use lopdf::{Document, Object};
    use pretty_assertions::assert_eq;

    fn pdf_file(name: &str, pages: u32) -> UploadedFile {
        UploadedFile::new(name, Some(PDF_MIME), create_test_pdf(pages, name))
    }

    fn request(tool: Tool, files: Vec<UploadedFile>, params: ToolParams) -> ToolRequest {
        ToolRequest {
            tool,
            files,
            params,
        }
    }

    fn pages_of(output: &ToolOutput) -> usize {
        Document::load_mem(&output.bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_no_files_rejected() {
        let err = run_tool(&request(Tool::MergePdf, vec![], ToolParams::default())).unwrap_err();
        assert_eq!(err.to_string(), "No files uploaded");
    }

    #[test]
    fn test_empty_upload_rejected() {
        let file = UploadedFile::new("blank.pdf", Some(PDF_MIME), Vec::new());
        let err = validate_files(Tool::SplitPdf, &[file]).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyFile(name) if name == "blank.pdf"));
    }

    #[test]
    fn test_single_file_tool_rejects_second_file() {
        let files = vec![pdf_file("a", 1), pdf_file("b", 1)];
        let err = validate_files(Tool::RotatePdf, &files).unwrap_err();
        assert!(matches!(err, ConvertError::TooManyFiles));
    }

    #[test]
    fn test_pdf_tool_rejects_images() {
        let png = create_test_image(4, 4, image::ImageFormat::Png);
        let file = UploadedFile::new("pic.png", Some("image/png"), png);
        let err = validate_files(Tool::MergePdf, &[file]).unwrap_err();
        assert_eq!(err.to_string(), "Only PDF files are allowed.");
    }

    #[test]
    fn test_pdf_sniffed_without_content_type() {
        let file = UploadedFile::new("upload", None, create_test_pdf(1, "x"));
        assert!(file.is_pdf());
        assert!(validate_files(Tool::SplitPdf, &[file]).is_ok());
    }

    #[test]
    fn test_image_tool_rejects_pdf() {
        let err = validate_files(Tool::ImageToPdf, &[pdf_file("doc", 1)]).unwrap_err();
        assert_eq!(err.to_string(), "Only image files (JPG, PNG) are allowed.");
    }

    #[test]
    fn test_merge_dispatch() {
        let output = run_tool(&request(
            Tool::MergePdf,
            vec![pdf_file("a", 2), pdf_file("b", 2)],
            ToolParams::default(),
        ))
        .unwrap();

        assert_eq!(output.filename, "merged.pdf");
        assert_eq!(output.content_type, "application/pdf");
        assert_eq!(pages_of(&output), 4);
    }

    #[test]
    fn test_split_dispatch() {
        let params = ToolParams {
            page_range: Some("1, 3".into()),
            ..Default::default()
        };
        let output = run_tool(&request(Tool::SplitPdf, vec![pdf_file("a", 4)], params)).unwrap();

        assert_eq!(output.filename, "extracted.pdf");
        assert_eq!(pages_of(&output), 2);
    }

    #[test]
    fn test_split_without_range_rejected() {
        let err = run_tool(&request(
            Tool::SplitPdf,
            vec![pdf_file("a", 2)],
            ToolParams::default(),
        ))
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRange(_)));
    }

    #[test]
    fn test_split_out_of_range_rejected() {
        let params = ToolParams {
            page_range: Some("7, 9".into()),
            ..Default::default()
        };
        let err = run_tool(&request(Tool::SplitPdf, vec![pdf_file("a", 3)], params)).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("Invalid page numbers"));
    }

    #[test]
    fn test_rotate_dispatch_defaults_to_ninety() {
        let output = run_tool(&request(
            Tool::RotatePdf,
            vec![pdf_file("a", 1)],
            ToolParams::default(),
        ))
        .unwrap();

        let doc = Document::load_mem(&output.bytes).unwrap();
        let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        assert_eq!(output.filename, "rotated.pdf");
    }

    #[test]
    fn test_protect_requires_password() {
        let params = ToolParams {
            password: Some(String::new()),
            ..Default::default()
        };
        let err =
            run_tool(&request(Tool::ProtectPdf, vec![pdf_file("a", 1)], params)).unwrap_err();
        assert_eq!(err.to_string(), "Password is required");
    }

    #[test]
    fn test_protect_dispatch() {
        let params = ToolParams {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let output = run_tool(&request(Tool::ProtectPdf, vec![pdf_file("a", 1)], params)).unwrap();
        assert_eq!(output.filename, "protected.pdf");
        assert!(output.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_protect_metrics_count_pages_of_encrypted_output() {
        let params = ToolParams {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let req = request(Tool::ProtectPdf, vec![pdf_file("a", 3)], params);
        let (outcome, summary) = run_tool_with_metrics(&req);

        assert_eq!(outcome.unwrap().page_count, 3);
        assert_eq!(summary.metrics.unwrap().page_count, 3);
    }

    #[test]
    fn test_rotate_dispatch_with_unbounded_range() {
        let params = ToolParams {
            page_range: Some("2-4294967295".into()),
            rotation: Some("180".into()),
            ..Default::default()
        };
        let output = run_tool(&request(Tool::RotatePdf, vec![pdf_file("a", 3)], params)).unwrap();

        let doc = Document::load_mem(&output.bytes).unwrap();
        let pages = doc.get_pages();
        let rotate_of = |n: u32| {
            doc.get_dictionary(pages[&n])
                .unwrap()
                .get(b"Rotate")
                .and_then(Object::as_i64)
                .unwrap_or(0)
        };
        assert_eq!(output.page_count, 3);
        assert_eq!(rotate_of(1), 0);
        assert_eq!(rotate_of(2), 180);
        assert_eq!(rotate_of(3), 180);
    }

    #[test]
    fn test_image_dispatch() {
        let jpeg = create_test_image(12, 12, image::ImageFormat::Jpeg);
        let file = UploadedFile::new("photo.jpg", Some("image/jpeg"), jpeg);
        let output =
            run_tool(&request(Tool::ImageToPdf, vec![file], ToolParams::default())).unwrap();

        assert_eq!(output.filename, "converted.pdf");
        assert_eq!(pages_of(&output), 1);
    }

    #[test]
    fn test_metrics_reported_on_success() {
        let req = request(
            Tool::MergePdf,
            vec![pdf_file("a", 1), pdf_file("b", 2)],
            ToolParams::default(),
        );
        let (outcome, summary) = run_tool_with_metrics(&req);

        assert!(outcome.is_ok());
        assert!(summary.success);
        let metrics = summary.metrics.unwrap();
        assert_eq!(metrics.page_count, 3);
        assert!(metrics.output_size_bytes > 0);
    }

    #[test]
    fn test_metrics_reported_on_failure() {
        let (outcome, summary) =
            run_tool_with_metrics(&request(Tool::MergePdf, vec![], ToolParams::default()));
        assert!(outcome.is_err());
        assert!(!summary.success);
        assert_eq!(summary.error.as_deref(), Some("No files uploaded"));
    }
}
