//! One function per subcommand, each driving a tool page

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use pdfkaro_client::HttpTransport;
use pdfkaro_core::api::interpret_response;
use pdfkaro_core::file::format_bytes;
use pdfkaro_core::thumbnails::{preview_document, SPLIT_SCALE, GRID_SCALE};
use pdfkaro_core::{
    ApiTransport, BlobStore, CompressMode, Delivery, ExportFormat, ExportKind, ExportOptions,
    MupdfRenderer, Navigator, PdfRenderer, ResultPage, ResultState, Route, SizeUnit,
    SubmissionOutcome, Tool, ToolPage,
};
use tracing::{info, warn};

use crate::arrange::Arrange;
use crate::collect;

pub fn compress_mode(quality: Option<u8>, target_size: Option<u32>, unit: SizeUnit) -> CompressMode {
    match (quality, target_size) {
        (_, Some(size)) => CompressMode::TargetSize { size, unit },
        (Some(quality), None) => CompressMode::Quality(quality),
        (None, None) => CompressMode::default(),
    }
}

pub fn export_options(format: ExportFormat, zip: bool, no_paths: bool, align: bool) -> ExportOptions {
    ExportOptions {
        format,
        kind: if zip { ExportKind::Zip } else { ExportKind::Single },
        include_paths: !no_paths,
        align_structure: align,
    }
}

pub struct Session {
    api: HttpTransport,
    blobs: BlobStore,
    nav: Navigator,
    output_dir: PathBuf,
}

impl Session {
    pub fn new(api: HttpTransport, output_dir: PathBuf) -> Self {
        Self {
            api,
            blobs: BlobStore::new(),
            nav: Navigator::default(),
            output_dir,
        }
    }

    fn open(&mut self, tool: &Tool) -> ToolPage<MupdfRenderer> {
        self.nav.navigate(tool.route(), None);
        ToolPage::new(*tool, MupdfRenderer)
    }

    pub async fn merge(&mut self, files: &[PathBuf], arrange: &Arrange) -> Result<PathBuf> {
        let mut page = self.open(&Tool::Merge);
        add(&mut page, collect::read_files(files)?);
        arrange.apply(&mut page)?;
        self.submit(&mut page).await
    }

    pub async fn split(
        &mut self,
        file: &Path,
        pages: Option<&str>,
        rotate: &[usize],
    ) -> Result<PathBuf> {
        let mut page = self.open(&Tool::Split);
        add(&mut page, collect::read_files(&[file.to_path_buf()])?);

        if let Some(ranges) = pages {
            page.select_ranges(ranges)
                .with_context(|| format!("Invalid page selection '{}'", ranges))?;
        }
        for &number in rotate {
            let id = page
                .pages()
                .iter()
                .find(|p| p.page_index + 1 == number as u32)
                .map(|p| p.id)
                .ok_or_else(|| anyhow!("Page {} does not exist", number))?;
            page.rotate(id)?;
        }

        self.submit(&mut page).await
    }

    /// Download one page directly, outside the split submission flow
    pub async fn extract(&mut self, file: &Path, number: u32) -> Result<PathBuf> {
        let mut page = self.open(&Tool::Split);
        add(&mut page, collect::read_files(&[file.to_path_buf()])?);

        let index = number
            .checked_sub(1)
            .ok_or_else(|| anyhow!("Page numbers start at 1"))?;
        let request = page.extract_page_request(index)?;
        let response = self.api.send(request).await?;
        let output = interpret_response(response)?;

        let file_name = output
            .suggested_name
            .unwrap_or_else(|| format!("page_{}_by_PDFkaro.in.pdf", number));
        let state = ResultState {
            object_url: self.blobs.create(output.bytes, output.content_type),
            file_name,
            origin: Route::Split,
        };
        self.nav.navigate(Route::SplitComplete, Some(state));
        self.deliver()
    }

    pub async fn compress(
        &mut self,
        files: &[PathBuf],
        mode: CompressMode,
        arrange: &Arrange,
    ) -> Result<PathBuf> {
        let mut page = self.open(&Tool::Compress(mode));
        add(&mut page, collect::read_files(files)?);
        arrange.apply(&mut page)?;
        self.submit(&mut page).await
    }

    pub async fn export(&mut self, paths: &[PathBuf], options: ExportOptions) -> Result<PathBuf> {
        let mut page = self.open(&Tool::ProjectExport(options));
        add(&mut page, collect::project_files(paths)?);
        info!(files = page.project_files().len(), "collected project files");
        self.submit(&mut page).await
    }

    async fn submit<R: PdfRenderer>(&mut self, page: &mut ToolPage<R>) -> Result<PathBuf> {
        match page.submit(&self.api, &self.blobs, &mut self.nav).await {
            SubmissionOutcome::Delivered(route) => {
                info!(route = %route, "job finished");
                self.deliver()
            }
            SubmissionOutcome::Failed(e) => match page.notice() {
                Some(notice) => bail!("{}", notice.message),
                None => Err(e.into()),
            },
            SubmissionOutcome::Stale => bail!("The request was superseded"),
        }
    }

    fn deliver(&mut self) -> Result<PathBuf> {
        let result = ResultPage::mount(&mut self.nav)
            .map_err(|redirect| anyhow!("No result to download (sent back to {})", redirect))?;

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        match result.deliver(None, &self.output_dir)? {
            Delivery::Saved(path) => {
                let size = result.blob().map(|b| b.bytes.len()).unwrap_or(0);
                info!(path = %path.display(), size = %format_bytes(size), "saved");
                Ok(path)
            }
            Delivery::Shared => Ok(self.output_dir.join(result.file_name())),
        }
    }
}

fn add<R: PdfRenderer>(page: &mut ToolPage<R>, files: Vec<pdfkaro_core::SelectedFile>) {
    page.add_files(files);
    if let Some(notice) = page.notice() {
        warn!("{}", notice.message);
    }
}

/// The `pages` subcommand: preview locally, print one line per page
pub fn list_pages(files: &[PathBuf], large: bool, thumbnails: Option<&Path>) -> Result<()> {
    let scale = if large { SPLIT_SCALE } else { GRID_SCALE };
    let renderer = MupdfRenderer;

    if let Some(dir) = thumbnails {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    for file in collect::read_files(files)? {
        if !file.is_pdf() {
            warn!("Skipping {}: not a PDF", file.name);
            continue;
        }
        let doc = renderer
            .open_document(&file.bytes)
            .with_context(|| format!("Failed to open {}", file.name))?;
        let preview = preview_document(doc.as_ref(), &file.name, scale);

        println!(
            "{} ({}, {} pages)",
            file.name,
            format_bytes(file.bytes.len()),
            preview.page_count
        );
        for page in &preview.pages {
            println!(
                "  p.{:<4} {}x{}",
                page.index + 1,
                page.thumbnail.width,
                page.thumbnail.height
            );
            if let Some(dir) = thumbnails {
                let stem = Path::new(&file.name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.name.clone());
                let path = dir.join(format!("{}_p{}.png", stem, page.index + 1));
                std::fs::write(&path, &page.thumbnail.png)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        for failure in &preview.failures {
            println!("  {}", failure);
        }
    }
    Ok(())
}
