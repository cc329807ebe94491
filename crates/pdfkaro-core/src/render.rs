//! PDF rendering capability
//!
//! Tool pages never reach for a rendering library directly; they are handed
//! a [`PdfRenderer`]. [`MupdfRenderer`] is the built-in implementation: MuPDF
//! opens the document and paints each page's content into an RGB pixmap at
//! the requested scale, which is then encoded as PNG. Intrinsic `/Rotate`
//! and the page box are applied by MuPDF.

use mupdf::{Colorspace, Document, Matrix, Pixmap};
use tracing::debug;

use crate::error::PdfKaroError;
use crate::page::Thumbnail;

/// Longest thumbnail edge, in pixels
const MAX_EDGE: f32 = 2048.0;

const PDF_MAGIC: &str = "application/pdf";

/// Opens documents for page counting and preview rendering
pub trait PdfRenderer {
    fn open_document(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, PdfKaroError>;
}

/// An opened document; pages are addressed by zero-based index
pub trait PdfDocument {
    fn page_count(&self) -> u32;

    fn render_page(&self, index: u32, scale: f32) -> Result<Thumbnail, PdfKaroError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfRenderer;

impl MupdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PdfRenderer for MupdfRenderer {
    fn open_document(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, PdfKaroError> {
        // MuPDF repairs almost anything; insist on the header first
        if !bytes.starts_with(b"%PDF-") {
            return Err(PdfKaroError::ParseError(
                "Not a valid PDF file (missing %PDF- header)".into(),
            ));
        }

        let document = Document::from_bytes(bytes, PDF_MAGIC)
            .map_err(|e| PdfKaroError::ParseError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| PdfKaroError::ParseError(e.to_string()))?;
        let page_count = u32::try_from(page_count).unwrap_or(0);
        if page_count == 0 {
            return Err(PdfKaroError::ParseError("PDF has no pages".into()));
        }

        debug!(page_count, "opened document");
        Ok(Box::new(MupdfDocument {
            document,
            page_count,
        }))
    }
}

struct MupdfDocument {
    document: Document,
    page_count: u32,
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&self, index: u32, scale: f32) -> Result<Thumbnail, PdfKaroError> {
        let fail = |reason: String| PdfKaroError::RenderError {
            page: index,
            reason,
        };

        if !(scale.is_finite() && scale > 0.0) {
            return Err(fail(format!("invalid scale {}", scale)));
        }
        if index >= self.page_count {
            return Err(fail(format!("page {} not found", index + 1)));
        }

        let page = self
            .document
            .load_page(index as i32)
            .map_err(|e| fail(e.to_string()))?;
        let bounds = page.bounds().map_err(|e| fail(e.to_string()))?;
        let longest = (bounds.x1 - bounds.x0).max(bounds.y1 - bounds.y0);
        let scale = if longest > 0.0 {
            scale.min(MAX_EDGE / longest)
        } else {
            scale
        };

        let matrix = Matrix::new_scale(scale, scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
            .map_err(|e| fail(e.to_string()))?;
        encode_png(&pixmap).map_err(fail)
    }
}

fn encode_png(pixmap: &Pixmap) -> Result<Thumbnail, String> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unexpected pixmap with {} components", n));
    }

    let samples = pixmap.samples();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in samples.chunks_exact(n).take(width as usize * height as usize) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    if rgb.len() != width as usize * height as usize * 3 {
        return Err("pixmap is shorter than its dimensions".to_string());
    }

    let mut png_bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_bytes, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
        writer.write_image_data(&rgb).map_err(|e| e.to_string())?;
    }

    Ok(Thumbnail {
        width,
        height,
        png: png_bytes,
    })
}
