//! Size-budgeted combine workflow.
//!
//! ```text
//! AwaitingFiles -> (files present) -> WithinBudget | OverBudget
//! WithinBudget | MergeFailed --trigger--> Merging -> MergeSucceeded | MergeFailed
//! ```
//!
//! "Files present" is not a resting phase: every upload or removal measures
//! the list and immediately lands in `WithinBudget` or `OverBudget`.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CombineConfig;
use crate::error::{MergeError, WorkflowError};
use crate::pdf::MergeEngine;
use crate::size::{BudgetGate, SizeReport, UploadedFile, bytes_to_mb};

/// Observable phase of a [`CombineWorkflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinePhase {
    AwaitingFiles,
    WithinBudget,
    OverBudget,
    Merging,
    MergeSucceeded,
    MergeFailed,
}

impl CombinePhase {
    /// Whether the merge trigger is accepted in this phase.
    pub const fn accepts_merge(self) -> bool {
        matches!(self, Self::WithinBudget | Self::MergeFailed)
    }
}

impl fmt::Display for CombinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AwaitingFiles => "awaiting files",
            Self::WithinBudget => "within budget",
            Self::OverBudget => "over budget",
            Self::Merging => "merging",
            Self::MergeSucceeded => "merge succeeded",
            Self::MergeFailed => "merge failed",
        };
        f.write_str(label)
    }
}

/// A successfully merged document, ready for download.
#[derive(Clone)]
pub struct CombinedDocument {
    bytes: Bytes,
    filename: String,
}

impl CombinedDocument {
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
        }
    }

    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.bytes.len() as u64)
    }
}

impl fmt::Debug for CombinedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedDocument")
            .field("filename", &self.filename)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// One user's combine session: uploaded files, their size report and the
/// outcome of the last merge.
#[derive(Debug, Clone)]
pub struct CombineWorkflow {
    files: Vec<UploadedFile>,
    gate: BudgetGate,
    output_filename: String,
    report: SizeReport,
    phase: CombinePhase,
    result: Option<CombinedDocument>,
    last_error: Option<String>,
}

impl CombineWorkflow {
    pub fn new(config: &CombineConfig) -> Self {
        let gate = BudgetGate::new(config.ceiling_mb);
        Self {
            files: Vec::new(),
            gate,
            output_filename: config.output_filename.clone(),
            report: SizeReport::empty(&gate),
            phase: CombinePhase::AwaitingFiles,
            result: None,
            last_error: None,
        }
    }

    /// Workflow with default settings and a custom ceiling.
    pub fn with_ceiling(ceiling_mb: f64) -> Self {
        Self::new(&CombineConfig {
            ceiling_mb,
            ..CombineConfig::default()
        })
    }

    pub const fn phase(&self) -> CombinePhase {
        self.phase
    }

    pub const fn report(&self) -> &SizeReport {
        &self.report
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub const fn result(&self) -> Option<&CombinedDocument> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub const fn can_merge(&self) -> bool {
        self.phase.accepts_merge()
    }

    pub const fn is_merging(&self) -> bool {
        matches!(self.phase, CombinePhase::Merging)
    }

    /// Append one file and re-evaluate the budget.
    pub fn add_file(&mut self, file: UploadedFile) -> Result<&SizeReport, WorkflowError> {
        self.add_files(std::iter::once(file))
    }

    /// Append files in order and re-evaluate the budget once.
    pub fn add_files(
        &mut self,
        files: impl IntoIterator<Item = UploadedFile>,
    ) -> Result<&SizeReport, WorkflowError> {
        self.ensure_idle()?;
        for file in files {
            debug!("Adding {} ({} bytes)", file.name(), file.len());
            self.files.push(file);
        }
        self.refresh();
        Ok(&self.report)
    }

    /// Remove the file at `index` (0-based) and re-evaluate the budget.
    pub fn remove_file(&mut self, index: usize) -> Result<UploadedFile, WorkflowError> {
        self.ensure_idle()?;
        if index >= self.files.len() {
            return Err(WorkflowError::NoSuchFile {
                index,
                count: self.files.len(),
            });
        }
        let removed = self.files.remove(index);
        debug!("Removed {} from position {}", removed.name(), index);
        self.refresh();
        Ok(removed)
    }

    /// Drop all files.
    pub fn clear(&mut self) -> Result<(), WorkflowError> {
        self.ensure_idle()?;
        self.files.clear();
        self.refresh();
        Ok(())
    }

    /// Enter `Merging` and hand out the buffers to merge, in upload order.
    ///
    /// The returned buffers share memory with the workflow's files; they are
    /// read-only, so a failed attempt can be repeated with identical input.
    pub fn begin_merge(&mut self) -> Result<Vec<Bytes>, WorkflowError> {
        if self.is_merging() {
            return Err(WorkflowError::Busy);
        }
        if !self.phase.accepts_merge() {
            return Err(WorkflowError::MergeNotAllowed { phase: self.phase });
        }

        self.phase = CombinePhase::Merging;
        self.result = None;
        self.last_error = None;

        info!(
            "Merging {} files ({:.2} MB)",
            self.files.len(),
            self.report.total_mb
        );

        Ok(self.files.iter().map(|f| f.bytes().clone()).collect())
    }

    /// Record the merge engine's outcome and leave `Merging`.
    pub fn finish_merge(
        &mut self,
        outcome: Result<Vec<u8>, MergeError>,
    ) -> Result<CombinePhase, WorkflowError> {
        if !self.is_merging() {
            return Err(WorkflowError::NotMerging);
        }

        match outcome {
            Ok(bytes) => {
                let document = CombinedDocument::new(bytes, self.output_filename.clone());
                info!(
                    "Merged {} files into {} ({:.2} MB)",
                    self.files.len(),
                    document.filename(),
                    document.size_mb()
                );
                self.result = Some(document);
                self.phase = CombinePhase::MergeSucceeded;
            }
            Err(e) => {
                let message = self.describe_merge_error(&e);
                warn!("Merge failed: {}", message);
                self.last_error = Some(message);
                self.phase = CombinePhase::MergeFailed;
            }
        }

        Ok(self.phase)
    }

    /// Run a complete merge synchronously with `engine`.
    pub fn merge_with(&mut self, engine: &dyn MergeEngine) -> Result<CombinePhase, WorkflowError> {
        let inputs = self.begin_merge()?;
        let outcome = engine.merge(&inputs);
        self.finish_merge(outcome)
    }

    /// Error message naming the offending upload when the engine reports one.
    fn describe_merge_error(&self, error: &MergeError) -> String {
        error
            .position()
            .and_then(|position| self.files.get(position.saturating_sub(1)))
            .map_or_else(
                || error.to_string(),
                |file| format!("{}: {error}", file.name()),
            )
    }

    const fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.is_merging() {
            Err(WorkflowError::Busy)
        } else {
            Ok(())
        }
    }

    /// Recompute the report from scratch and pick the budget phase.
    fn refresh(&mut self) {
        self.report = SizeReport::measure(&self.files, &self.gate);
        self.result = None;
        self.last_error = None;
        self.phase = if self.files.is_empty() {
            CombinePhase::AwaitingFiles
        } else if self.report.over_limit {
            CombinePhase::OverBudget
        } else {
            CombinePhase::WithinBudget
        };
    }
}

impl Default for CombineWorkflow {
    fn default() -> Self {
        Self::new(&CombineConfig::default())
    }
}
