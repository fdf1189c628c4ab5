//! API handlers for the ConvertIO server
//!
//! Provides REST endpoints for:
//! - Health checks
//! - Tool listing
//! - The multipart conversion endpoint

use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use convertio_core::{
    run_tool_with_metrics, ConvertError, Tool, ToolInfo, ToolParams, ToolRequest, UploadedFile,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "convertio-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Tool list response
#[derive(Serialize)]
pub struct ToolListResponse {
    pub success: bool,
    pub tools: Vec<ToolInfo>,
    pub count: usize,
}

/// Handler: GET /api/tools
pub async fn handle_list_tools() -> Json<ToolListResponse> {
    let tools: Vec<ToolInfo> = Tool::all().iter().map(Tool::info).collect();
    let count = tools.len();

    Json(ToolListResponse {
        success: true,
        tools,
        count,
    })
}

/// Form fields of a conversion request before the selector is checked
#[derive(Default)]
struct ConvertForm {
    slug: Option<String>,
    files: Vec<UploadedFile>,
    params: ToolParams,
}

async fn read_form(mut multipart: Multipart) -> Result<ConvertForm, ServerError> {
    let mut form = ConvertForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "slug" => form.slug = Some(field.text().await?),
            "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                debug!(
                    "Received {} ({} bytes, {:?})",
                    file_name,
                    bytes.len(),
                    content_type
                );
                form.files.push(UploadedFile {
                    name: file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "pageRange" => form.params.page_range = Some(field.text().await?),
            "rotation" => form.params.rotation = Some(field.text().await?),
            "password" => form.params.password = Some(field.text().await?),
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(form)
}

/// Handler: POST /api/convert
///
/// Responds with the PDF as an attachment, or a JSON error body.
pub async fn handle_convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;

    if form.files.is_empty() {
        return Err(ConvertError::NoFiles.into());
    }

    let slug = form.slug.unwrap_or_default();
    let tool: Tool = slug.parse()?;

    info!(
        "Convert request: tool={}, files={}",
        tool,
        form.files.len()
    );

    let request = ToolRequest {
        tool,
        files: form.files,
        params: form.params,
    };

    let timeout_ms = state.timeout_ms;
    let task = tokio::task::spawn_blocking(move || run_tool_with_metrics(&request));
    let (outcome, summary) = tokio::time::timeout(Duration::from_millis(timeout_ms), task)
        .await
        .map_err(|_| ServerError::Timeout(timeout_ms))?
        .map_err(|e| ServerError::Internal(format!("Worker task failed: {}", e)))?;

    match &summary.metrics {
        Some(metrics) => info!(
            "{} finished in {}ms: {} -> {} bytes",
            tool, metrics.processing_time_ms, metrics.input_size_bytes, metrics.output_size_bytes
        ),
        None => warn!("{} failed: {}", tool, summary.error.as_deref().unwrap_or_default()),
    }

    let output = outcome?;

    Ok((
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.filename),
            ),
        ],
        output.bytes,
    )
        .into_response())
}
