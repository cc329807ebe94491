//! PDFkaro.in tool pages
//!
//! Everything a PDF tool page does before and after talking to the
//! processing API: accepting files, previewing and arranging pages, turning
//! the arrangement into a request, and handing the result to a download page.
//!
//! - [`ToolPage`]: controller for merge, split, compress and project export
//! - [`WorkingSet`]: ordered, reorderable entries with stable identity
//! - [`PdfRenderer`]: injected capability for page counts and thumbnails
//! - [`ApiTransport`]: injected capability for sending requests
//! - [`Navigator`] / [`ResultPage`]: routes, navigation state and delivery
//!
//! No networking happens in this crate; see `pdfkaro-client`.

pub mod api;
pub mod blob;
pub mod controller;
pub mod error;
pub mod file;
pub mod navigation;
pub mod page;
pub mod project;
pub mod render;
pub mod request;
pub mod result;
pub mod submission;
pub mod thumbnails;
pub mod tool;
pub mod working_set;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api::{interpret_response, ApiResponse, ApiTransport, JobOutput};
pub use blob::{BlobStore, ObjectUrl, ObjectUrlHandle};
pub use controller::{
    AddReport, Notice, NoticeKind, Submission, SubmissionOutcome, SubmissionTicket, ToolPage,
};
pub use error::PdfKaroError;
pub use file::{SelectedFile, UploadedFile};
pub use navigation::{Navigator, ResultState, Route};
pub use page::{EntryId, PageEntry, Rotation, Thumbnail};
pub use project::ProjectFile;
pub use render::{MupdfRenderer, PdfDocument, PdfRenderer};
pub use request::{ApiRequest, FormPart, RequestBody};
pub use result::{Delivery, ResultPage, ShareTarget};
pub use tool::{CompressMode, ExportFormat, ExportKind, ExportOptions, SizeUnit, Tool};
pub use working_set::WorkingSet;

/// Parse page range string like "1-3, 5, 8-10" into sorted unique page numbers
pub fn parse_ranges(input: &str) -> Result<Vec<u32>, PdfKaroError> {
    use std::collections::BTreeSet;

    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| PdfKaroError::InvalidRange(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| PdfKaroError::InvalidRange(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(PdfKaroError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }

            pages.extend(start..=end);
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| PdfKaroError::InvalidRange(format!("Invalid page: {}", part)))?;
            pages.insert(page);
        }
    }

    Ok(pages.into_iter().collect())
}
