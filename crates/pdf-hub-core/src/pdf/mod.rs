mod convert;
mod document;
mod docx;
mod merge;
mod optimize;
mod page_index;
mod page_tree;
mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use convert::{ConvertedDocument, Converter, DocxConverter};
pub use document::{DocumentMetadata, PdfDocument};
pub use docx::DocxBuilder;
pub use merge::{LopdfMerger, MergeEngine, merge_documents};
pub use optimize::{
    DPI_RANGE, LopdfOptimizer, OptimizeOptions, OptimizeReport, Optimized, Optimizer,
    QUALITY_RANGE,
};
pub use page_index::PageIndex;
pub use text::{BoundingBox, PageText, TextBlock, TextExtractor};
