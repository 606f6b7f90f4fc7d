//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting `Option` and `Result` types
//! into HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use pdf_hub_core::{ConversionError, Error, OptimizeError, WorkflowError};

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 404 Not Found error.
    fn or_not_found(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::NOT_FOUND, msg.to_string()))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;

    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> RouteResult<T>;

    /// Converts the error to 409 Conflict.
    fn or_conflict(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    fn or_bad_request(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }

    fn or_conflict(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::CONFLICT, e.to_string()))
    }
}

/// Map workflow misuse to a status: bad index is the client's fault, the
/// rest means "not now".
pub fn workflow_error(error: &WorkflowError) -> (StatusCode, String) {
    let status = match error {
        WorkflowError::NoSuchFile { .. } => StatusCode::BAD_REQUEST,
        WorkflowError::Busy
        | WorkflowError::MergeNotAllowed { .. }
        | WorkflowError::NotMerging => StatusCode::CONFLICT,
    };
    (status, error.to_string())
}

/// Map a reduce/convert failure to a status.
///
/// Bad input documents and out-of-range options are 422; anything else is
/// a server fault.
pub fn tool_error(error: &Error) -> (StatusCode, String) {
    let status = match error {
        Error::Optimize(
            OptimizeError::InvalidQuality(_)
            | OptimizeError::InvalidDpi(_)
            | OptimizeError::InvalidInput(_),
        )
        | Error::Conversion(
            ConversionError::InvalidInput(_)
            | ConversionError::Empty
            | ConversionError::InvalidPage { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

/// POST-Redirect-GET: `HX-Redirect` for HTMX, 303 See Other otherwise.
pub fn redirect(headers: &HeaderMap, url: &str) -> RouteResult<Response> {
    if is_htmx(headers) {
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, url)
            .body(Body::empty())
            .or_internal_error()
    }
}

/// `Content-Disposition` value with an ASCII fallback name and the exact
/// UTF-8 name for clients that understand `filename*`.
pub fn attachment(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

/// Binary download response.
pub fn download(
    bytes: impl Into<Body>,
    content_type: &str,
    filename: &str,
    len: usize,
) -> RouteResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, attachment(filename))
        .header(header::CONTENT_LENGTH, len)
        .body(bytes.into())
        .or_internal_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_ascii() {
        assert_eq!(
            attachment("arquivos_combinados.pdf"),
            "attachment; filename=\"arquivos_combinados.pdf\"; filename*=UTF-8''arquivos_combinados.pdf"
        );
    }

    #[test]
    fn test_attachment_non_ascii() {
        let value = attachment("relatório \"final\".pdf");
        assert!(value.starts_with("attachment; filename=\"relat_rio _final_.pdf\""));
        assert!(value.ends_with("relat%C3%B3rio%20%22final%22.pdf"));
    }

    #[test]
    fn test_workflow_error_status() {
        assert_eq!(workflow_error(&WorkflowError::Busy).0, StatusCode::CONFLICT);
        assert_eq!(
            workflow_error(&WorkflowError::NoSuchFile { index: 3, count: 1 }).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_tool_error_status() {
        let bad_input = Error::Conversion(ConversionError::Empty);
        assert_eq!(tool_error(&bad_input).0, StatusCode::UNPROCESSABLE_ENTITY);

        let save = Error::Optimize(OptimizeError::Save("disk full".to_string()));
        assert_eq!(tool_error(&save).0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
