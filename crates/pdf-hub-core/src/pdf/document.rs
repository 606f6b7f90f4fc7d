use bytes::Bytes;
use mupdf::{Document as MuDocument, MetadataName};

use crate::error::ConversionError;

/// Source PDF for conversion: the raw bytes plus what was learned on open.
///
/// MuPDF handles are not `Send`, so only the bytes are kept and every
/// extraction pass opens its own handle through [`PdfDocument::open`].
#[derive(Clone)]
pub struct PdfDocument {
    bytes: Bytes,
    metadata: DocumentMetadata,
    page_count: usize,
}

/// Info-dictionary fields carried over into the DOCX core properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl PdfDocument {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, ConversionError> {
        let bytes = bytes.into();
        let doc = open_mupdf(&bytes)?;

        let page_count = doc
            .page_count()
            .map_err(|e| ConversionError::InvalidInput(format!("cannot count pages: {e}")))?;

        Ok(Self {
            metadata: DocumentMetadata {
                title: info_field(&doc, MetadataName::Title),
                author: info_field(&doc, MetadataName::Author),
            },
            page_count: usize::try_from(page_count).unwrap_or(0),
            bytes,
        })
    }

    pub const fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub(crate) fn open(&self) -> Result<MuDocument, ConversionError> {
        open_mupdf(&self.bytes)
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("metadata", &self.metadata)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn open_mupdf(bytes: &[u8]) -> Result<MuDocument, ConversionError> {
    MuDocument::from_bytes(bytes, "")
        .map_err(|e| ConversionError::InvalidInput(format!("cannot open PDF: {e}")))
}

/// Absent keys come back from MuPDF as empty strings.
fn info_field(doc: &MuDocument, name: MetadataName) -> Option<String> {
    doc.metadata(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
