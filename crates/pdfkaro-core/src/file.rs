//! User-selected files
//!
//! A [`SelectedFile`] is what the user picked or dropped; it becomes an
//! [`UploadedFile`] once it passes the PDF filter and has been decoded.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::PdfKaroError;

pub const PDF_MIME: &str = "application/pdf";

/// Identity of an uploaded file within one tool page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// A file as offered by the user, before any validation
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type, if the source knows one
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.map(str::to_string),
            bytes,
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = if has_pdf_extension(&name) {
            Some(PDF_MIME)
        } else {
            None
        };
        Ok(Self::new(name, mime, bytes))
    }

    /// Whether this file passes the PDF-only accept filter.
    ///
    /// A declared MIME type wins; without one the extension decides. Either
    /// way the bytes must start with the `%PDF-` header.
    pub fn is_pdf(&self) -> bool {
        let declared = match self.mime.as_deref() {
            Some(mime) => mime.eq_ignore_ascii_case(PDF_MIME),
            None => has_pdf_extension(&self.name),
        };
        declared && self.bytes.starts_with(b"%PDF-")
    }
}

fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// An accepted PDF with its derived page count
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: FileId,
    pub name: String,
    /// Size in bytes, as uploaded
    pub size: usize,
    pub bytes: Arc<[u8]>,
    pub page_count: u32,
}

/// Reject anything that is not a PDF before it reaches the renderer
pub fn check_pdf(file: &SelectedFile) -> Result<(), PdfKaroError> {
    if file.is_pdf() {
        Ok(())
    } else {
        Err(PdfKaroError::RejectedFile(file.name.clone()))
    }
}

/// Pick a name not already in `taken`: `a.pdf`, then `a (1).pdf`, `a (2).pdf`...
pub fn unique_name<'a, I>(name: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let is_taken = |candidate: &str| taken.clone().into_iter().any(|t| t == candidate);
    if !is_taken(name) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };

    let mut n = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
