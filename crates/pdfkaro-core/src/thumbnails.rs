//! Thumbnail generation
//!
//! Pages are rendered one at a time, in order, at a small fixed scale. A page
//! that fails is logged and left out; the rest of the file still previews.

use tracing::{debug, warn};

use crate::error::PdfKaroError;
use crate::page::Thumbnail;
use crate::render::PdfDocument;

/// Scale used by the grid views (merge, compress)
pub const GRID_SCALE: f32 = 0.3;

/// Scale used by the split view, which shows fewer, larger previews
pub const SPLIT_SCALE: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Zero-based page index
    pub index: u32,
    pub thumbnail: Thumbnail,
}

/// Result of previewing one document
#[derive(Debug, Default)]
pub struct Preview {
    pub page_count: u32,
    pub pages: Vec<RenderedPage>,
    pub failures: Vec<PdfKaroError>,
}

impl Preview {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render every page of `doc` sequentially
pub fn preview_document(doc: &dyn PdfDocument, file_name: &str, scale: f32) -> Preview {
    let page_count = doc.page_count();
    let mut preview = Preview {
        page_count,
        pages: Vec::with_capacity(page_count as usize),
        failures: Vec::new(),
    };

    for index in 0..page_count {
        match doc.render_page(index, scale) {
            Ok(thumbnail) => preview.pages.push(RenderedPage { index, thumbnail }),
            Err(e) => {
                warn!(file = file_name, page = index + 1, error = %e, "page preview failed");
                preview.failures.push(e);
            }
        }
    }

    debug!(
        file = file_name,
        rendered = preview.pages.len(),
        failed = preview.failures.len(),
        "preview finished"
    );
    preview
}
