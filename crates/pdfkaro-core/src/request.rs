//! Request building for the processing API
//!
//! A working set is serialized as the original binaries, attached once each,
//! plus an instruction list naming `(source file, page index, rotation)` for
//! every page in output order. The same file may feed many reordered,
//! individually rotated pages, so the binaries and the arrangement travel
//! separately.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PdfKaroError;
use crate::file::{UploadedFile, PDF_MIME};
use crate::page::{PageEntry, Rotation};
use crate::project::ProjectFile;
use crate::tool::{endpoints, CompressMode, ExportOptions, Tool};

/// One page of the output, for merge and compress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInstruction {
    pub source_file: String,
    pub page_index: u32,
    pub rotation: Rotation,
}

/// One extracted page, for split (the source file is implied)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractInstruction {
    pub page_index: u32,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    File {
        field: &'static str,
        file_name: String,
        mime: &'static str,
        bytes: Arc<[u8]>,
    },
    Text {
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Multipart(Vec<FormPart>),
    Json(serde_json::Value),
}

/// A transport-agnostic POST to the processing API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Path relative to the API base URL
    pub endpoint: &'static str,
    pub body: RequestBody,
}

impl ApiRequest {
    /// File names attached under `field`, in attachment order
    pub fn file_names(&self, field: &str) -> Vec<&str> {
        match &self.body {
            RequestBody::Multipart(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    FormPart::File { field: f, file_name, .. } if *f == field => {
                        Some(file_name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            RequestBody::Json(_) => Vec::new(),
        }
    }

    /// Value of a text field in a multipart body
    pub fn text_field(&self, field: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Multipart(parts) => parts.iter().find_map(|part| match part {
                FormPart::Text { field: f, value } if *f == field => Some(value.as_str()),
                _ => None,
            }),
            RequestBody::Json(_) => None,
        }
    }
}

pub fn page_instructions(pages: &[PageEntry]) -> Vec<PageInstruction> {
    pages
        .iter()
        .map(|page| PageInstruction {
            source_file: page.source_name.clone(),
            page_index: page.page_index,
            rotation: page.rotation,
        })
        .collect()
}

/// Files referenced by `pages`, each once, in upload order
pub fn referenced_files<'a>(
    pages: &[PageEntry],
    files: &'a [UploadedFile],
) -> Vec<&'a UploadedFile> {
    let used: HashSet<_> = pages.iter().map(|p| p.source).collect();
    files.iter().filter(|f| used.contains(&f.id)).collect()
}

fn pdf_part(field: &'static str, file: &UploadedFile) -> FormPart {
    FormPart::File {
        field,
        file_name: file.name.clone(),
        mime: PDF_MIME,
        bytes: Arc::clone(&file.bytes),
    }
}

fn text(field: &'static str, value: impl Into<String>) -> FormPart {
    FormPart::Text {
        field,
        value: value.into(),
    }
}

/// Build the merge or compress request for an arranged page set
pub fn build_page_request(
    tool: &Tool,
    pages: &[PageEntry],
    files: &[UploadedFile],
) -> Result<ApiRequest, PdfKaroError> {
    tool.validate()?;
    if pages.is_empty() {
        return Err(PdfKaroError::Validation(
            "Add at least one page before submitting".into(),
        ));
    }

    let sources = referenced_files(pages, files);
    if sources.len() < tool.min_files() {
        return Err(PdfKaroError::Validation(format!(
            "Please upload at least {} PDF files",
            tool.min_files()
        )));
    }

    let mut parts: Vec<FormPart> = sources.iter().map(|f| pdf_part("files", f)).collect();
    parts.push(text(
        "pages_data",
        serde_json::to_string(&page_instructions(pages))?,
    ));

    match tool {
        Tool::Merge => {}
        Tool::Compress(CompressMode::Quality(quality)) => {
            parts.push(text("quality", quality.to_string()));
        }
        Tool::Compress(CompressMode::TargetSize { size, unit }) => {
            parts.push(text("target_size", size.to_string()));
            parts.push(text("size_unit", unit.as_str()));
        }
        Tool::Split | Tool::ProjectExport(_) => {
            return Err(PdfKaroError::Validation(format!(
                "{} does not submit a page arrangement",
                tool
            )));
        }
    }

    Ok(ApiRequest {
        endpoint: tool.endpoint(),
        body: RequestBody::Multipart(parts),
    })
}

/// Build the split request. An empty `selected` list asks for every page,
/// returned as a zip archive.
pub fn build_split_request(
    file: &UploadedFile,
    selected: &[PageEntry],
) -> Result<ApiRequest, PdfKaroError> {
    let mut pages: Vec<_> = selected
        .iter()
        .map(|p| ExtractInstruction {
            page_index: p.page_index,
            rotation: p.rotation,
        })
        .collect();
    pages.sort_by_key(|p| p.page_index);

    Ok(ApiRequest {
        endpoint: endpoints::SPLIT,
        body: RequestBody::Multipart(vec![
            pdf_part("file", file),
            text("pages_to_extract", serde_json::to_string(&pages)?),
        ]),
    })
}

/// Build a request for one page of `file` (zero-based)
pub fn build_extract_page_request(
    file: &UploadedFile,
    page_index: u32,
) -> Result<ApiRequest, PdfKaroError> {
    if page_index >= file.page_count {
        return Err(PdfKaroError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            page_index + 1,
            file.page_count
        )));
    }

    Ok(ApiRequest {
        endpoint: endpoints::EXTRACT_SINGLE_PAGE,
        body: RequestBody::Multipart(vec![
            pdf_part("file", file),
            text("page_number", page_index.to_string()),
        ]),
    })
}

#[derive(Serialize)]
struct ExportPayload<'a> {
    files: &'a [ProjectFile],
    output_format: crate::tool::ExportFormat,
    include_paths: bool,
    align_structure: bool,
}

pub fn build_export_request(
    options: &ExportOptions,
    files: &[ProjectFile],
) -> Result<ApiRequest, PdfKaroError> {
    if files.is_empty() {
        return Err(PdfKaroError::Validation(
            "Please upload files or a folder first.".into(),
        ));
    }

    let payload = ExportPayload {
        files,
        output_format: options.format,
        include_paths: options.include_paths,
        align_structure: options.align_structure,
    };

    Ok(ApiRequest {
        endpoint: Tool::ProjectExport(*options).endpoint(),
        body: RequestBody::Json(serde_json::to_value(&payload)?),
    })
}
