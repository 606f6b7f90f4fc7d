//! PDF to DOCX conversion.

use bytes::Bytes;
use tracing::{debug, info};

use super::docx::DocxBuilder;
use super::document::PdfDocument;
use super::text::TextExtractor;
use crate::config::{ConvertConfig, DEFAULT_CONVERTED_FILENAME};
use crate::error::ConversionError;
use crate::size::bytes_to_mb;

/// PDFs may carry up to 1024 bytes of junk before the header.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Result of a conversion, ready to hand out as a download.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    pub paragraph_count: usize,
}

impl ConvertedDocument {
    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.bytes.len() as u64)
    }
}

/// Turns a PDF into an editable word-processing document.
pub trait Converter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str {
        "convert"
    }

    fn convert_to_document(&self, pdf: &[u8]) -> Result<ConvertedDocument, ConversionError>;
}

/// MuPDF text extraction feeding a DOCX writer.
#[derive(Debug, Clone)]
pub struct DocxConverter {
    pub page_breaks: bool,
    pub output_filename: String,
}

impl DocxConverter {
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            page_breaks: config.page_breaks,
            output_filename: config.output_filename.clone(),
        }
    }
}

impl Default for DocxConverter {
    fn default() -> Self {
        Self {
            page_breaks: true,
            output_filename: DEFAULT_CONVERTED_FILENAME.to_string(),
        }
    }
}

impl Converter for DocxConverter {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn convert_to_document(&self, pdf: &[u8]) -> Result<ConvertedDocument, ConversionError> {
        if !has_pdf_header(pdf) {
            return Err(ConversionError::InvalidInput(
                "missing %PDF- header".to_string(),
            ));
        }

        let doc = PdfDocument::from_bytes(Bytes::copy_from_slice(pdf))?;
        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(ConversionError::Empty);
        }

        let extractor = TextExtractor::new(&doc);
        let mut builder = DocxBuilder::new()
            .with_title(doc.metadata().title.clone())
            .with_author(doc.metadata().author.clone());

        for page_num in 0..page_count {
            let page = extractor.extract_page(page_num)?;
            debug!("Page {}: {} text blocks", page_num + 1, page.blocks.len());

            if page_num == 0 {
                builder.set_page_size(page.width, page.height);
            } else if self.page_breaks {
                builder.add_page_break();
            }

            for block in &page.blocks {
                builder.add_paragraph(&block.text, block.font_size);
            }
        }

        let paragraph_count = builder.paragraph_count();
        let bytes = builder.finish()?;

        info!(
            "Converted {} pages into {} paragraphs ({} bytes)",
            page_count,
            paragraph_count,
            bytes.len()
        );

        Ok(ConvertedDocument {
            bytes,
            filename: self.output_filename.clone(),
            page_count,
            paragraph_count,
        })
    }
}

fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
