//! Askama templates for full pages and HTMX fragments.
//!
//! The combine page embeds `partials/combine_panel.html`; every mutating
//! combine request from HTMX gets that panel back and swaps it in place
//! (`hx-swap="outerHTML"` on `#combine-panel`).

use askama::Template;
use askama_web::WebTemplate;
use pdf_hub_core::pdf::{DPI_RANGE, QUALITY_RANGE};
use pdf_hub_core::util::format_mb;
use pdf_hub_core::{CombinePhase, CombineWorkflow, OptimizeConfig};

// =============================================================================
// Full Page Templates
// =============================================================================

/// Tool picker.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Size reduction form.
#[derive(Template, WebTemplate)]
#[template(path = "reduce.html")]
pub struct ReduceTemplate {
    pub default_quality: u8,
    pub default_dpi: u32,
    pub min_quality: u8,
    pub max_quality: u8,
    pub min_dpi: u32,
    pub max_dpi: u32,
}

impl ReduceTemplate {
    pub const fn new(config: &OptimizeConfig) -> Self {
        Self {
            default_quality: config.image_quality,
            default_dpi: config.image_dpi,
            min_quality: *QUALITY_RANGE.start(),
            max_quality: *QUALITY_RANGE.end(),
            min_dpi: *DPI_RANGE.start(),
            max_dpi: *DPI_RANGE.end(),
        }
    }
}

/// PDF to DOCX form.
#[derive(Template, WebTemplate)]
#[template(path = "convert.html")]
pub struct ConvertTemplate {
    pub output_filename: String,
}

/// Full combine page around the panel fragment.
#[derive(Template, WebTemplate)]
#[template(path = "combine.html")]
pub struct CombineTemplate {
    pub panel: CombinePanel,
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// One row of the uploaded-file table.
pub struct FileRow {
    pub index: usize,
    pub position: usize,
    pub name: String,
    pub size: String,
}

/// Everything the combine panel shows, pre-formatted for display.
#[derive(Template, WebTemplate)]
#[template(path = "partials/combine_panel.html")]
pub struct CombinePanel {
    pub session_id: String,
    pub files: Vec<FileRow>,
    pub total: String,
    pub ceiling: String,
    pub excess: String,
    pub percent_used: u8,
    pub over_limit: bool,
    pub phase: String,
    pub can_merge: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub result: Option<ResultInfo>,
}

/// Merged document summary.
pub struct ResultInfo {
    pub filename: String,
    pub size: String,
}

impl CombinePanel {
    pub fn from_workflow(session_id: &str, workflow: &CombineWorkflow) -> Self {
        let report = workflow.report();

        let files = workflow
            .files()
            .iter()
            .zip(&report.file_sizes_mb)
            .enumerate()
            .map(|(index, (file, size_mb))| FileRow {
                index,
                position: index + 1,
                name: file.name().to_string(),
                size: format_mb(*size_mb),
            })
            .collect();

        let result = workflow
            .result()
            .filter(|_| workflow.phase() == CombinePhase::MergeSucceeded)
            .map(|doc| ResultInfo {
                filename: doc.filename().to_string(),
                size: format_mb(doc.size_mb()),
            });

        Self {
            session_id: session_id.to_string(),
            files,
            total: format_mb(report.total_mb),
            ceiling: format_mb(report.ceiling_mb),
            excess: format_mb(report.delta_mb.max(0.0)),
            percent_used: report.percent_used(),
            over_limit: report.over_limit,
            phase: workflow.phase().to_string(),
            can_merge: workflow.can_merge(),
            busy: workflow.is_merging(),
            error: workflow.last_error().map(str::to_string),
            result,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pdf_hub_core::UploadedFile;

    #[test]
    fn test_panel_over_budget() {
        let mut workflow = CombineWorkflow::with_ceiling(0.001);
        workflow
            .add_file(UploadedFile::new("big.pdf", vec![0_u8; 4096]))
            .unwrap();

        let panel = CombinePanel::from_workflow("abc", &workflow);
        assert!(panel.over_limit);
        assert!(!panel.can_merge);
        assert_eq!(panel.files[0].position, 1);
        assert_eq!(panel.files[0].name, "big.pdf");

        let html = panel.render().unwrap();
        assert!(html.contains("big.pdf"));
        assert!(html.contains("disabled"));
    }

    #[test]
    fn test_panel_empty() {
        let panel = CombinePanel::from_workflow("abc", &CombineWorkflow::default());
        assert!(panel.files.is_empty());
        assert_eq!(panel.total, "0.00 MB");
        assert_eq!(panel.ceiling, "200.00 MB");
    }

    #[test]
    fn test_reduce_template_ranges() {
        let template = ReduceTemplate::new(&OptimizeConfig::default());
        let html = template.render().unwrap();
        assert!(html.contains(r#"min="10""#));
        assert!(html.contains(r#"max="300""#));
        assert!(html.contains(r#"value="75""#));
    }
}
