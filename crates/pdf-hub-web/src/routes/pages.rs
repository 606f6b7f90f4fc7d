//! Page routes - full HTML page renders.

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{
    CombinePanel, CombineTemplate, ConvertTemplate, IndexTemplate, ReduceTemplate,
};

/// Landing page with the three tools.
pub async fn index() -> IndexTemplate {
    IndexTemplate
}

pub async fn reduce_page(State(state): State<Arc<AppState>>) -> ReduceTemplate {
    ReduceTemplate::new(&state.config().optimize)
}

pub async fn convert_page(State(state): State<Arc<AppState>>) -> ConvertTemplate {
    ConvertTemplate {
        output_filename: state.config().convert.output_filename.clone(),
    }
}

/// Combine page for an existing session (direct URL access, reloads).
pub async fn combine_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<CombineTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let panel = session
        .with_session(|s| CombinePanel::from_workflow(&session_id, &s.workflow))
        .await
        .or_not_found("Session not found")?;

    Ok(CombineTemplate { panel })
}
