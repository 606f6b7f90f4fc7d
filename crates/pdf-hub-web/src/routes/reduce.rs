//! Reduce route - one-shot size reduction of an uploaded PDF.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::Response,
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use pdf_hub_core::{Error, OptimizeOptions};
use pdf_hub_core::util::reduced_filename;
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{self, ResultExt, RouteResult, tool_error};
use crate::state::AppState;

/// Upload plus the optional quality knobs from the reduce form.
struct ReduceForm {
    filename: String,
    data: Bytes,
    image_quality: Option<u8>,
    image_dpi: Option<u32>,
}

impl ReduceForm {
    async fn read(mut multipart: Multipart) -> RouteResult<Self> {
        let mut upload = None;
        let mut image_quality = None;
        let mut image_dpi = None;

        while let Some(field) = multipart.next_field().await.or_bad_request()? {
            match field.name() {
                Some("file") => {
                    let filename = field.file_name().unwrap_or("documento.pdf").to_string();
                    let data = field.bytes().await.or_bad_request()?;
                    upload = Some((filename, data));
                }
                Some("image_quality") => {
                    image_quality = parse_number(&field.text().await.or_bad_request()?)?;
                }
                Some("image_dpi") => {
                    image_dpi = parse_number(&field.text().await.or_bad_request()?)?;
                }
                _ => {}
            }
        }

        let (filename, data) = upload
            .filter(|(_, data)| !data.is_empty())
            .ok_or((StatusCode::BAD_REQUEST, "No file uploaded".to_string()))?;

        Ok(Self {
            filename,
            data,
            image_quality,
            image_dpi,
        })
    }
}

/// Blank means "use the default".
fn parse_number<T: std::str::FromStr>(raw: &str) -> RouteResult<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Not a number: {raw}")))
}

/// Reduce the uploaded PDF and send it back as `<name>_reduzido.pdf`.
///
/// The byte counts before and after travel in `X-Original-Size` and
/// `X-Optimized-Size`.
pub async fn reduce_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> RouteResult<Response> {
    let form = ReduceForm::read(multipart).await?;

    let defaults = &state.config().optimize;
    let options = OptimizeOptions::new(
        form.image_quality.unwrap_or(defaults.image_quality),
        form.image_dpi.unwrap_or(defaults.image_dpi),
    )
    .map_err(|e| tool_error(&Error::from(e)))?;

    info!(
        "Reducing {} ({} bytes, quality {}, {} dpi)",
        form.filename,
        form.data.len(),
        options.image_quality,
        options.image_dpi
    );

    let toolkit = Arc::clone(&state.toolkit);
    let data = form.data;
    let optimized = tokio::task::spawn_blocking(move || toolkit.optimize(&data, Some(options)))
        .await
        .map_err(|e| {
            error!("Reduce task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PDF reduction failed".to_string(),
            )
        })?
        .map_err(|e| {
            error!("Failed to reduce {}: {}", form.filename, e);
            tool_error(&e)
        })?;

    let report = optimized.report;
    let len = optimized.bytes.len();
    let mut response = helpers::download(
        optimized.bytes,
        "application/pdf",
        &reduced_filename(&form.filename),
        len,
    )?;

    let headers = response.headers_mut();
    headers.insert("X-Original-Size", HeaderValue::from(report.original_bytes));
    headers.insert("X-Optimized-Size", HeaderValue::from(report.optimized_bytes));

    Ok(response)
}
