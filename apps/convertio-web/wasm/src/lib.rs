//! WASM bindings for the ConvertIO tools
//!
//! The same operations the server runs, available in the browser so a tool
//! page can convert without an upload. State lives in Rust:
//! - Selected tool, files and parameters via `ConvertSession`
//! - Upload validation as files are dropped in
//! - JavaScript only handles DOM events and file I/O
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ConvertSession, list_tools } from './pkg/convertio_wasm.js';
//!
//! await init();
//!
//! const session = new ConvertSession("split-pdf");
//! session.setProgressCallback((current, total, msg) => updateUI(current, total, msg));
//! session.addFile(file.name, file.type, bytes);
//! session.setPageRange("1-3, 5");
//! const result = session.execute();
//! downloadBlob(result, session.outputFilename);
//! ```

pub mod session;

use convertio_core::{Tool, ToolInfo};
use wasm_bindgen::prelude::*;

pub use session::ConvertSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Describe every tool for the listing page
#[wasm_bindgen]
pub fn list_tools() -> Result<JsValue, JsValue> {
    let tools: Vec<ToolInfo> = Tool::all().iter().map(Tool::info).collect();

    serde_wasm_bindgen::to_value(&tools)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    convertio_core::quick_validate(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get detailed PDF info without creating a session
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info =
        convertio_core::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    convertio_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
