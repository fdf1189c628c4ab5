//! Stateful conversion session
//!
//! One session per tool page. Files are validated as they are added, so the
//! upload widget can show the error next to the drop zone instead of after
//! a round trip.

use convertio_core::{
    parse_ranges, resolve_pages, run_tool, validate_files, validate_pdf, ConvertError, InputKind,
    Rotation, Tool, ToolParams, ToolRequest, UploadedFile,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Summary of an accepted file, handed back to the UI
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: usize,
    /// Page count for PDFs, absent for images
    pub page_count: Option<u32>,
}

/// Stateful session holding the uploads for one tool
#[wasm_bindgen]
pub struct ConvertSession {
    tool: Tool,
    files: Vec<UploadedFile>,
    summaries: Vec<FileSummary>,
    params: ToolParams,
    progress_callback: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl ConvertSession {
    /// Create a session for the tool named by `slug`
    #[wasm_bindgen(constructor)]
    pub fn new(slug: &str) -> Result<ConvertSession, JsValue> {
        let tool: Tool = slug.parse().map_err(|e: ConvertError| js_error(&e))?;
        Ok(Self::for_tool(tool))
    }

    /// Tool slug this session runs
    #[wasm_bindgen(getter)]
    pub fn slug(&self) -> String {
        self.tool.slug().to_string()
    }

    /// Download name of the result
    #[wasm_bindgen(getter, js_name = outputFilename)]
    pub fn output_filename(&self) -> String {
        self.tool.output_filename().to_string()
    }

    /// Set a progress callback function
    /// Callback signature: (current: number, total: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Add a file to the session
    /// Returns the file summary on success, the user-facing message on rejection
    #[wasm_bindgen(js_name = addFile)]
    pub fn add_file(
        &mut self,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<JsValue, JsValue> {
        let content_type = Some(content_type).filter(|t| !t.is_empty());
        let summary = self
            .add_file_internal(name, content_type, bytes)
            .map_err(|e| js_error(&e))?;

        serde_wasm_bindgen::to_value(&summary)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Remove a file by index
    #[wasm_bindgen(js_name = removeFile)]
    pub fn remove_file(&mut self, index: usize) -> Result<(), JsValue> {
        if index >= self.files.len() {
            return Err(JsValue::from_str("File index out of bounds"));
        }
        self.files.remove(index);
        self.summaries.remove(index);
        Ok(())
    }

    /// Drop every file, keeping the parameters
    #[wasm_bindgen(js_name = clearFiles)]
    pub fn clear_files(&mut self) {
        self.files.clear();
        self.summaries.clear();
    }

    /// Accepted files, in upload order
    #[wasm_bindgen(js_name = getFiles)]
    pub fn get_files(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.summaries)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = getFileCount)]
    pub fn get_file_count(&self) -> usize {
        self.files.len()
    }

    /// Set the page selection, e.g. "1-3, 5, 8-10"
    #[wasm_bindgen(js_name = setPageRange)]
    pub fn set_page_range(&mut self, range: &str) -> Result<(), JsValue> {
        self.set_page_range_internal(range).map_err(|e| js_error(&e))
    }

    /// Set the rotation angle in degrees
    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&mut self, degrees: i32) -> Result<(), JsValue> {
        self.set_rotation_internal(degrees).map_err(|e| js_error(&e))
    }

    /// Set the open password for protect
    #[wasm_bindgen(js_name = setPassword)]
    pub fn set_password(&mut self, password: &str) {
        self.params.password = Some(password.to_string());
    }

    /// Check if session is ready for execution
    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        if self.files.is_empty() {
            return false;
        }

        match self.tool {
            Tool::SplitPdf => has_text(&self.params.page_range),
            Tool::ProtectPdf => has_text(&self.params.password),
            _ => true,
        }
    }

    /// Execute the tool and return the PDF as Uint8Array
    pub fn execute(&self) -> Result<js_sys::Uint8Array, JsValue> {
        self.report_progress(0, 100, "Starting...");

        let result = self.execute_internal().map_err(|e| {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "{} failed: {}",
                self.tool, e
            )));
            js_error(&e)
        })?;

        self.report_progress(100, 100, "Complete");

        let array = js_sys::Uint8Array::new_with_length(result.len() as u32);
        array.copy_from(&result);
        Ok(array)
    }
}

impl ConvertSession {
    pub fn for_tool(tool: Tool) -> Self {
        Self {
            tool,
            files: Vec::new(),
            summaries: Vec::new(),
            params: ToolParams::default(),
            progress_callback: None,
        }
    }

    /// Validate and add a file (testable without JsValue)
    ///
    /// Applies the upload rules one file at a time: single-file tools refuse
    /// a second file, and PDFs must parse before they are accepted.
    pub fn add_file_internal(
        &mut self,
        name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<FileSummary, ConvertError> {
        if !self.tool.accepts_multiple() && !self.files.is_empty() {
            return Err(ConvertError::TooManyFiles);
        }

        let file = UploadedFile::new(name, content_type, bytes.to_vec());
        validate_files(self.tool, std::slice::from_ref(&file))?;

        let page_count = match self.tool.input_kind() {
            InputKind::Pdf => Some(validate_pdf(bytes)?.page_count),
            InputKind::Image => None,
        };

        let summary = FileSummary {
            name: name.to_string(),
            size_bytes: bytes.len(),
            page_count,
        };

        self.files.push(file);
        self.summaries.push(summary.clone());
        Ok(summary)
    }

    /// Store a page selection, checked against the loaded PDF when there is one
    pub fn set_page_range_internal(&mut self, range: &str) -> Result<(), ConvertError> {
        if range.trim().is_empty() {
            self.params.page_range = None;
            return Ok(());
        }

        let pages = parse_ranges(range)?;
        if let Some(page_count) = self.summaries.first().and_then(|s| s.page_count) {
            resolve_pages(&pages, page_count)?;
        }

        self.params.page_range = Some(range.to_string());
        Ok(())
    }

    /// Store the angle as the form field would carry it, so execution reads it the way the server does
    pub fn set_rotation_internal(&mut self, degrees: i32) -> Result<(), ConvertError> {
        Rotation::from_degrees(degrees.into())?;
        self.params.rotation = Some(degrees.to_string());
        Ok(())
    }

    /// Run the tool over the current files and parameters
    pub fn execute_internal(&self) -> Result<Vec<u8>, ConvertError> {
        self.report_progress(10, 100, "Processing...");

        let request = ToolRequest {
            tool: self.tool,
            files: self.files.clone(),
            params: self.params.clone(),
        };
        let output = run_tool(&request)?;

        self.report_progress(90, 100, "Finalizing...");
        Ok(output.bytes)
    }

    /// Report progress to JavaScript callback
    fn report_progress(&self, current: u32, total: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            let this = JsValue::null();
            let _ = callback.call3(
                &this,
                &JsValue::from(current),
                &JsValue::from(total),
                &JsValue::from_str(message),
            );
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// The message a user sees for a rejected upload or failed run
fn js_error(err: &ConvertError) -> JsValue {
    let message = match err {
        ConvertError::UnsupportedTool(_) => "Tool not supported".to_string(),
        ConvertError::InvalidRange(_) => "Invalid page numbers".to_string(),
        other if !other.is_client_error() => "Operation failed".to_string(),
        other => other.to_string(),
    };
    JsValue::from_str(&message)
}
