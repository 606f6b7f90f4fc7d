//! Checked conversion from Rust page numbers to MuPDF's `i32` indices.

use std::fmt;

use crate::error::ConversionError;

/// A zero-based page index known to fit MuPDF's page API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Validate `page_num` against the document's page count.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::InvalidPage {
            page: page_num,
            total: total_pages,
        };

        if page_num >= total_pages {
            return Err(invalid());
        }
        i32::try_from(page_num).map(Self).map_err(|_| invalid())
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
