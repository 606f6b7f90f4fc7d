//! Upload size accounting and the size-budget gate.
//!
//! Sizes are reported in mebibytes (bytes / 1024²) and never rounded here;
//! rounding is left to whoever displays them.

use bytes::Bytes;
use serde::Serialize;

use crate::config::DEFAULT_CEILING_MB;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert a byte count to MiB.
#[allow(clippy::cast_precision_loss)] // exact up to 2^53 bytes
pub fn bytes_to_mb(len: u64) -> f64 {
    len as f64 / BYTES_PER_MB
}

/// An uploaded file: display name plus an immutable byte buffer.
///
/// Cloning shares the buffer; nothing in the crate ever mutates it.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.len())
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Outcome of checking an aggregate size against the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetDecision {
    /// True iff aggregate <= ceiling
    pub admit: bool,
    /// aggregate - ceiling; negative means headroom
    pub delta_mb: f64,
}

/// Fixed-ceiling size gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetGate {
    ceiling_mb: f64,
}

impl BudgetGate {
    pub const fn new(ceiling_mb: f64) -> Self {
        Self { ceiling_mb }
    }

    pub const fn ceiling_mb(&self) -> f64 {
        self.ceiling_mb
    }

    /// Admit iff `total_mb <= ceiling` (the boundary itself is admitted).
    pub fn evaluate(&self, total_mb: f64) -> BudgetDecision {
        BudgetDecision {
            admit: total_mb <= self.ceiling_mb,
            delta_mb: total_mb - self.ceiling_mb,
        }
    }
}

impl Default for BudgetGate {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING_MB)
    }
}

/// Size figures for one snapshot of the uploaded file list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeReport {
    /// Per-file sizes in MiB, parallel to the input order
    pub file_sizes_mb: Vec<f64>,
    /// Aggregate size in MiB
    pub total_mb: f64,
    pub ceiling_mb: f64,
    /// True iff total > ceiling
    pub over_limit: bool,
    /// total - ceiling
    pub delta_mb: f64,
}

impl SizeReport {
    /// Measure `files` and evaluate them against `gate`.
    ///
    /// The aggregate is converted once from the exact byte total instead of
    /// summing per-file MiB values.
    pub fn measure(files: &[UploadedFile], gate: &BudgetGate) -> Self {
        let file_sizes_mb = files.iter().map(UploadedFile::size_mb).collect();
        let total_bytes: u64 = files.iter().map(UploadedFile::len).sum();
        let total_mb = bytes_to_mb(total_bytes);
        let decision = gate.evaluate(total_mb);

        Self {
            file_sizes_mb,
            total_mb,
            ceiling_mb: gate.ceiling_mb(),
            over_limit: !decision.admit,
            delta_mb: decision.delta_mb,
        }
    }

    /// Report for an empty file list.
    pub fn empty(gate: &BudgetGate) -> Self {
        Self::measure(&[], gate)
    }

    pub fn file_count(&self) -> usize {
        self.file_sizes_mb.len()
    }

    /// Headroom left under the ceiling (0 when over).
    pub fn remaining_mb(&self) -> f64 {
        (-self.delta_mb).max(0.0)
    }

    /// Share of the ceiling in use, clamped to 0..=100.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent_used(&self) -> u8 {
        if self.ceiling_mb <= 0.0 {
            return 100;
        }
        (self.total_mb / self.ceiling_mb * 100.0).clamp(0.0, 100.0).round() as u8
    }
}
