//! Combine routes - session lifecycle, uploads, merge trigger and download.
//!
//! Every mutating route answers HTMX with the refreshed combine panel and
//! plain form posts with a 303 back to the combine page.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use pdf_hub_core::{CombinePhase, MergeError, SizeReport, UploadedFile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{self, OptionExt, ResultExt, RouteResult, is_htmx, redirect, workflow_error};
use crate::state::{AppState, SessionRef};
use crate::templates::CombinePanel;

/// JSON view of a combine session.
#[derive(Serialize)]
pub struct CombineStatus {
    pub phase: CombinePhase,
    pub report: SizeReport,
    pub can_merge: bool,
    pub error: Option<String>,
    pub result: Option<CombinedSummary>,
}

#[derive(Serialize)]
pub struct CombinedSummary {
    pub filename: String,
    pub size_mb: f64,
}

/// Start a new combine session and go to its page.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session_id = state.create_session().await;
    info!("Created combine session {}", session_id);

    redirect(&headers, &format!("/combine/{session_id}"))
}

/// Append every uploaded `files` part, in submission order.
///
/// Empty parts (a file input submitted with nothing selected) are skipped.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() != Some("files") {
            continue;
        }

        let filename = field.file_name().unwrap_or("documento.pdf").to_string();
        let data = field.bytes().await.or_bad_request()?;
        if data.is_empty() {
            continue;
        }

        files.push(UploadedFile::new(filename, data));
    }

    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    let count = files.len();
    let (total_mb, over_limit) = session
        .with_session_mut(|s| {
            s.workflow
                .add_files(files)
                .map(|report| (report.total_mb, report.over_limit))
        })
        .await
        .or_not_found("Session not found")?
        .map_err(|e| workflow_error(&e))?;

    info!(
        "Session {}: added {} files, total {:.2} MB{}",
        session_id,
        count,
        total_mb,
        if over_limit { " (over budget)" } else { "" }
    );

    panel_or_redirect(&session, &session_id, &headers).await
}

/// Remove the file at `index` (0-based, upload order).
pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let removed = session
        .with_session_mut(|s| s.workflow.remove_file(index))
        .await
        .or_not_found("Session not found")?
        .map_err(|e| workflow_error(&e))?;

    info!("Session {}: removed {}", session_id, removed.name());
    panel_or_redirect(&session, &session_id, &headers).await
}

/// Drop every uploaded file and any previous result.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session_mut(|s| s.workflow.clear())
        .await
        .or_not_found("Session not found")?
        .map_err(|e| workflow_error(&e))?;

    panel_or_redirect(&session, &session_id, &headers).await
}

/// Merge trigger.
///
/// The session lock is only held to enter and leave `Merging`; the merge
/// itself runs on the blocking pool. Leaving `Merging` happens in a spawned
/// task, so it still runs when the client disconnects and this handler is
/// dropped. A failed merge still answers with the panel (which shows the
/// error), so the user can retry.
pub async fn merge(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let inputs = session
        .with_session_mut(|s| s.workflow.begin_merge())
        .await
        .or_not_found("Session not found")?
        .map_err(|e| workflow_error(&e))?;

    let task_state = Arc::clone(&state);
    let task_id = session_id.clone();
    let phase = tokio::spawn(async move {
        let merger = task_state.toolkit.merger();
        let outcome = tokio::task::spawn_blocking(move || merger.merge(&inputs))
            .await
            .unwrap_or_else(|e| {
                error!("Merge task panicked: {}", e);
                Err(MergeError::Save("merge task failed".to_string()))
            });

        let session = task_state.get_session(&task_id).await?;
        session
            .with_session_mut(|s| s.workflow.finish_merge(outcome))
            .await
    })
    .await
    .or_internal_error()?
    .or_not_found("Session not found")?
    .map_err(|e| workflow_error(&e))?;

    info!("Session {}: {}", session_id, phase);
    panel_or_redirect(&session, &session_id, &headers).await
}

/// Current phase, size report and result summary as JSON.
pub async fn report(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Json<CombineStatus>> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let status = session
        .with_session(|s| CombineStatus {
            phase: s.workflow.phase(),
            report: s.workflow.report().clone(),
            can_merge: s.workflow.can_merge(),
            error: s.workflow.last_error().map(str::to_string),
            result: s.workflow.result().map(|doc| CombinedSummary {
                filename: doc.filename().to_string(),
                size_mb: doc.size_mb(),
            }),
        })
        .await
        .or_not_found("Session not found")?;

    Ok(Json(status))
}

/// Download the merged document.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Bytes clone is a refcount bump; the lock is released before streaming
    let document = session
        .with_session(|s| s.workflow.result().cloned())
        .await
        .or_not_found("Session not found")?
        .ok_or("No merged document yet")
        .or_conflict()?;

    let len = document.bytes().len();
    helpers::download(
        document.bytes().clone(),
        "application/pdf",
        document.filename(),
        len,
    )
}

/// Panel fragment for HTMX, redirect to the combine page otherwise.
async fn panel_or_redirect(
    session: &SessionRef<'_>,
    session_id: &str,
    headers: &HeaderMap,
) -> RouteResult<Response> {
    if !is_htmx(headers) {
        return redirect(headers, &format!("/combine/{session_id}"));
    }

    let panel = session
        .with_session(|s| CombinePanel::from_workflow(session_id, &s.workflow))
        .await
        .or_not_found("Session not found")?;

    Ok(panel.into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pdf_hub_core::{
        AppConfig, DocxConverter, LopdfOptimizer, MergeEngine, PdfToolkit,
    };
    use std::time::Duration;

    /// Takes long enough for the request to be abandoned mid-merge.
    struct SlowMerger;

    impl MergeEngine for SlowMerger {
        fn merge(&self, _inputs: &[Bytes]) -> Result<Vec<u8>, MergeError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(b"%PDF-1.5 merged".to_vec())
        }
    }

    async fn session_with_file(state: &AppState) -> String {
        let id = state.create_session().await;
        state
            .get_session(&id)
            .await
            .unwrap()
            .with_session_mut(|s| {
                s.workflow
                    .add_file(UploadedFile::new("a.pdf", b"%PDF-1.5".to_vec()))
                    .map(|_| ())
            })
            .await
            .unwrap()
            .unwrap();
        id
    }

    async fn phase(state: &AppState, id: &str) -> CombinePhase {
        state
            .get_session(id)
            .await
            .unwrap()
            .with_session(|s| s.workflow.phase())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_abandoned_merge_request_still_finishes() {
        let toolkit = PdfToolkit::with_engines(
            AppConfig::default(),
            Arc::new(SlowMerger),
            Arc::new(LopdfOptimizer::default()),
            Arc::new(DocxConverter::default()),
        );
        let state = Arc::new(AppState::with_toolkit(toolkit));
        let id = session_with_file(&state).await;

        // Client gives up while the engine is still running
        let request = merge(State(Arc::clone(&state)), Path(id.clone()), HeaderMap::new());
        let abandoned = tokio::time::timeout(Duration::from_millis(50), request).await;
        assert!(abandoned.is_err());
        assert_eq!(phase(&state, &id).await, CombinePhase::Merging);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(phase(&state, &id).await, CombinePhase::MergeSucceeded);

        // No longer Busy: the file list is editable again
        let removed = state
            .get_session(&id)
            .await
            .unwrap()
            .with_session_mut(|s| s.workflow.remove_file(0).map(|file| file.name().to_string()))
            .await
            .unwrap();
        assert_eq!(removed, Ok("a.pdf".to_string()));
    }
}
