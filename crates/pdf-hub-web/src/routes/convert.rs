//! Convert route - PDF to DOCX.

use axum::{extract::State, http::StatusCode, response::Response};
use axum_extra::extract::Multipart;
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{self, ResultExt, RouteResult, tool_error};
use crate::state::AppState;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Convert the uploaded `file` and send back the DOCX.
pub async fn convert_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("documento.pdf").to_string();
            let data = field.bytes().await.or_bad_request()?;
            upload = Some((filename, data));
            break;
        }
    }

    let (filename, data) = upload
        .filter(|(_, data)| !data.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "No file uploaded".to_string()))?;

    let toolkit = Arc::clone(&state.toolkit);
    let converted = tokio::task::spawn_blocking(move || toolkit.convert(&data))
        .await
        .map_err(|e| {
            error!("Conversion task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PDF conversion failed".to_string(),
            )
        })?
        .map_err(|e| {
            error!("Failed to convert {}: {}", filename, e);
            tool_error(&e)
        })?;

    info!(
        "Converted {} ({} pages, {} paragraphs)",
        filename, converted.page_count, converted.paragraph_count
    );

    let len = converted.bytes.len();
    helpers::download(converted.bytes, DOCX_CONTENT_TYPE, &converted.filename, len)
}
