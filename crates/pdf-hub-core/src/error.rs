use thiserror::Error;

use crate::workflow::CombinePhase;

/// Failure of the merge engine.
///
/// A merge is all-or-nothing: when any of these is returned, no output
/// document exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The engine was called with an empty input list
    #[error("no documents to merge")]
    NoInputs,

    /// One input could not be parsed as a PDF (1-based position)
    #[error("input {position} is not a valid PDF: {reason}")]
    InvalidInput { position: usize, reason: String },

    /// A page of an otherwise valid input could not be read
    #[error("input {position} has an unreadable page: {reason}")]
    InvalidPage { position: usize, reason: String },

    /// The merged document could not be serialized
    #[error("failed to save merged PDF: {0}")]
    Save(String),
}

impl MergeError {
    /// 1-based position of the offending input, if the error is tied to one.
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::InvalidInput { position, .. } | Self::InvalidPage { position, .. } => {
                Some(*position)
            }
            Self::NoInputs | Self::Save(_) => None,
        }
    }
}

/// Failure of the size-reduction pipeline.
#[derive(Error, Debug)]
pub enum OptimizeError {
    /// JPEG quality outside 10..=100
    #[error("image quality {0} is out of range (10-100)")]
    InvalidQuality(u8),

    /// Target resolution outside 50..=300
    #[error("image resolution {0} dpi is out of range (50-300)")]
    InvalidDpi(u32),

    /// The input could not be parsed as a PDF
    #[error("input is not a valid PDF: {0}")]
    InvalidInput(String),

    /// The optimized document could not be serialized
    #[error("failed to save optimized PDF: {0}")]
    Save(String),
}

/// Failure of the PDF to DOCX conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The input could not be opened as a PDF
    #[error("input is not a valid PDF: {0}")]
    InvalidInput(String),

    /// The PDF has no pages to convert
    #[error("document has no pages")]
    Empty,

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    InvalidPage { page: usize, total: usize },

    /// Failed to extract text from a PDF page
    #[error("failed to extract text from page {page}: {reason}")]
    TextExtraction { page: usize, reason: String },

    /// Failed to write the DOCX package
    #[error("failed to write document: {0}")]
    Write(String),
}

/// Misuse of the combine workflow.
///
/// None of these is a merge failure: the workflow state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A merge is running; the file list is frozen until it finishes
    #[error("a merge is in progress")]
    Busy,

    /// The merge trigger is only accepted within budget
    #[error("merge is not available while {phase}")]
    MergeNotAllowed { phase: CombinePhase },

    /// `finish_merge` without a matching `begin_merge`
    #[error("no merge is in progress")]
    NotMerging,

    /// Removal index outside the file list
    #[error("no file at position {index} (workflow has {count} files)")]
    NoSuchFile { index: usize, count: usize },
}

/// Unified error type for pdf-hub-core
///
/// Wraps the three operation error kinds (kept distinct) together with
/// configuration and I/O failures, for callers that only need one type.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Operation Errors
    // ==========================================================================
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
