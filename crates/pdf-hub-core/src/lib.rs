//! PDF Hub Core Library
//!
//! Building blocks for a small PDF toolbox:
//! - Size-budgeted combining of many PDFs into one
//! - Lossy size reduction (metadata scrub, image downsampling, pruning)
//! - PDF to DOCX conversion

pub mod config;
pub mod error;
pub mod pdf;
pub mod size;
pub mod util;
pub mod workflow;

pub use config::{AppConfig, CombineConfig, ConvertConfig, OptimizeConfig, ServerConfig};
pub use error::{ConversionError, Error, MergeError, OptimizeError, Result, WorkflowError};
pub use pdf::{
    ConvertedDocument, Converter, DocxConverter, LopdfMerger, LopdfOptimizer, MergeEngine,
    OptimizeOptions, OptimizeReport, Optimized, Optimizer, PdfDocument,
};
pub use size::{BudgetDecision, BudgetGate, SizeReport, UploadedFile};
pub use workflow::{CombinePhase, CombineWorkflow, CombinedDocument};

use std::sync::Arc;

use tracing::info;

/// Entry point bundling configuration with the three PDF engines.
///
/// Engines are shared behind `Arc` so callers can move them into blocking
/// tasks without holding on to the toolkit.
pub struct PdfToolkit {
    config: AppConfig,
    merger: Arc<dyn MergeEngine>,
    optimizer: Arc<dyn Optimizer>,
    converter: Arc<dyn Converter>,
}

impl PdfToolkit {
    /// Create a toolkit with the default engines
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let optimizer = LopdfOptimizer::from_config(&config.optimize);
        let converter = DocxConverter::from_config(&config.convert);

        Ok(Self {
            merger: Arc::new(LopdfMerger::new()),
            optimizer: Arc::new(optimizer),
            converter: Arc::new(converter),
            config,
        })
    }

    /// Create with custom engines
    pub fn with_engines(
        config: AppConfig,
        merger: Arc<dyn MergeEngine>,
        optimizer: Arc<dyn Optimizer>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            config,
            merger,
            optimizer,
            converter,
        }
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A fresh combine workflow using the configured ceiling.
    pub fn combine_workflow(&self) -> CombineWorkflow {
        CombineWorkflow::new(&self.config.combine)
    }

    pub fn merger(&self) -> Arc<dyn MergeEngine> {
        Arc::clone(&self.merger)
    }

    /// Run the merge trigger of `workflow` synchronously.
    pub fn merge(&self, workflow: &mut CombineWorkflow) -> Result<CombinePhase> {
        Ok(workflow.merge_with(self.merger.as_ref())?)
    }

    /// Reduce `pdf`, using the configured options unless `options` is given.
    pub fn optimize(&self, pdf: &[u8], options: Option<OptimizeOptions>) -> Result<Optimized> {
        let options = match options {
            Some(options) => options,
            None => self.config.optimize.options()?,
        };

        let optimized = self.optimizer.optimize(pdf, &options)?;
        info!(
            "{} reduced {} -> {} bytes",
            self.optimizer.name(),
            optimized.report.original_bytes,
            optimized.report.optimized_bytes
        );
        Ok(optimized)
    }

    pub fn convert(&self, pdf: &[u8]) -> Result<ConvertedDocument> {
        Ok(self.converter.convert_to_document(pdf)?)
    }
}

impl std::fmt::Debug for PdfToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfToolkit")
            .field("merger", &self.merger.name())
            .field("optimizer", &self.optimizer.name())
            .field("converter", &self.converter.name())
            .finish_non_exhaustive()
    }
}
