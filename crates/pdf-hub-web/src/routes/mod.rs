//! HTTP route handlers for the PDF hub web application.
//!
//! Pages and combine-panel fragments are HTML (Askama); reduce, convert and
//! combine downloads are binary attachments.

mod combine;
mod convert;
mod pages;
mod reduce;

pub use combine::{clear, create_session, download, merge, remove_file, report, upload_files};
pub use convert::{DOCX_CONTENT_TYPE, convert_pdf};
pub use pages::{combine_page, convert_page, index, reduce_page};
pub use reduce::reduce_pdf;
