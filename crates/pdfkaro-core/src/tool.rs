//! Tool configuration
//!
//! One parameterized [`Tool`] per page; the mode switches (quality vs size
//! compression, single file vs zip export) are configuration, not separate
//! pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PdfKaroError;
use crate::navigation::Route;
use crate::thumbnails::{GRID_SCALE, SPLIT_SCALE};

pub mod endpoints {
    pub const MERGE: &str = "/api/v1/merge";
    pub const SPLIT: &str = "/api/v1/split";
    pub const EXTRACT_SINGLE_PAGE: &str = "/api/v1/extract-single-page";
    pub const COMPRESS_QUALITY: &str = "/api/v1/compress/quality";
    pub const COMPRESS_SIZE: &str = "/api/v1/compress/size";
    pub const EXPORT_SINGLE: &str = "/api/v1/project-exporter/single";
    pub const EXPORT_ZIP: &str = "/api/v1/project-exporter/zip";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    #[serde(rename = "KB")]
    Kilobytes,
    #[serde(rename = "MB")]
    Megabytes,
}

impl SizeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            SizeUnit::Kilobytes => "KB",
            SizeUnit::Megabytes => "MB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = PdfKaroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KB" => Ok(SizeUnit::Kilobytes),
            "MB" => Ok(SizeUnit::Megabytes),
            other => Err(PdfKaroError::Validation(format!(
                "Unknown size unit '{}' (expected KB or MB)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressMode {
    /// Quality percentage, 1..=100
    Quality(u8),
    TargetSize { size: u32, unit: SizeUnit },
}

impl Default for CompressMode {
    fn default() -> Self {
        CompressMode::Quality(50)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Txt,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Docx => "docx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PdfKaroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_start_matches('.') {
            "txt" => Ok(ExportFormat::Txt),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(PdfKaroError::Validation(format!(
                "Unknown export format '{}' (expected txt or docx)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportKind {
    /// Combine every file into one document
    #[default]
    Single,
    /// Each file converted separately, returned as a zip archive
    Zip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub kind: ExportKind,
    pub include_paths: bool,
    pub align_structure: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Txt,
            kind: ExportKind::Single,
            include_paths: true,
            align_structure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Merge,
    Split,
    Compress(CompressMode),
    ProjectExport(ExportOptions),
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Merge => "merge",
            Tool::Split => "split",
            Tool::Compress(_) => "compress",
            Tool::ProjectExport(_) => "project-exporter",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Tool::Merge => endpoints::MERGE,
            Tool::Split => endpoints::SPLIT,
            Tool::Compress(CompressMode::Quality(_)) => endpoints::COMPRESS_QUALITY,
            Tool::Compress(CompressMode::TargetSize { .. }) => endpoints::COMPRESS_SIZE,
            Tool::ProjectExport(ExportOptions {
                kind: ExportKind::Single,
                ..
            }) => endpoints::EXPORT_SINGLE,
            Tool::ProjectExport(ExportOptions {
                kind: ExportKind::Zip,
                ..
            }) => endpoints::EXPORT_ZIP,
        }
    }

    /// Route of the tool page itself
    pub fn route(&self) -> Route {
        match self {
            Tool::Merge => Route::Merge,
            Tool::Split => Route::Split,
            Tool::Compress(_) => Route::Compress,
            Tool::ProjectExport(_) => Route::ProjectExporter,
        }
    }

    /// Route the page hands off to once a result arrives
    pub fn result_route(&self) -> Route {
        match self {
            Tool::Merge => Route::MergeComplete,
            Tool::Split => Route::SplitComplete,
            Tool::Compress(_) => Route::CompressComplete,
            Tool::ProjectExport(_) => Route::Download,
        }
    }

    /// PDF tools accept only PDFs; the exporter takes any text file
    pub fn accepts_only_pdf(&self) -> bool {
        !matches!(self, Tool::ProjectExport(_))
    }

    /// Whether the tool holds a single source file at a time
    pub fn single_file(&self) -> bool {
        matches!(self, Tool::Split)
    }

    pub fn thumbnail_scale(&self) -> f32 {
        match self {
            Tool::Split => SPLIT_SCALE,
            _ => GRID_SCALE,
        }
    }

    /// Minimum number of distinct source files needed to submit
    pub fn min_files(&self) -> usize {
        match self {
            Tool::Merge => 2,
            _ => 1,
        }
    }

    /// Check tool parameters before anything is sent
    pub fn validate(&self) -> Result<(), PdfKaroError> {
        match self {
            Tool::Compress(CompressMode::Quality(q)) if !(1..=100).contains(q) => Err(
                PdfKaroError::Validation(format!("Quality must be between 1 and 100, got {}", q)),
            ),
            Tool::Compress(CompressMode::TargetSize { size: 0, .. }) => Err(
                PdfKaroError::Validation("Target size must be greater than zero".into()),
            ),
            _ => Ok(()),
        }
    }

    /// File name offered when the server does not suggest one.
    ///
    /// `pages_selected` only matters for split: no selection means every
    /// page comes back as a zip archive.
    pub fn default_file_name(&self, pages_selected: bool) -> String {
        match self {
            Tool::Merge => "merged_by_PDFkaro.in.pdf".to_string(),
            Tool::Split if pages_selected => "extracted_pages.pdf".to_string(),
            Tool::Split => "split_pages.zip".to_string(),
            Tool::Compress(_) => "compressed_by_PDFkaro.in.pdf".to_string(),
            Tool::ProjectExport(ExportOptions {
                kind: ExportKind::Single,
                format,
                ..
            }) => format!("project_export.{}", format.extension()),
            Tool::ProjectExport(ExportOptions {
                kind: ExportKind::Zip,
                ..
            }) => "project_export.zip".to_string(),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
