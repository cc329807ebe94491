//! Tool page controller
//!
//! Drives one tool page through select -> preview/arrange -> submit -> hand
//! off to the result page. Every user-visible problem ends up in
//! [`ToolPage::notice`]; the same problem is logged where it happens.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{interpret_response, ApiResponse, ApiTransport};
use crate::blob::BlobStore;
use crate::error::PdfKaroError;
use crate::file::{check_pdf, unique_name, FileId, SelectedFile, UploadedFile};
use crate::navigation::{Navigator, ResultState, Route};
use crate::page::{EntryId, PageEntry};
use crate::parse_ranges;
use crate::project::ProjectFile;
use crate::render::PdfRenderer;
use crate::request::{
    build_export_request, build_extract_page_request, build_page_request, build_split_request,
    ApiRequest,
};
use crate::submission::{RequestToken, RequestTracker};
use crate::thumbnails::{preview_document, Preview};
use crate::tool::Tool;
use crate::working_set::WorkingSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Wrong file type, nothing was added
    Rejected,
    /// A file or page could not be decoded or rendered
    Unreadable,
    /// Not enough input or bad parameters; no request was made
    Validation,
    /// The request failed in transit or the server refused it
    Submission,
}

/// The one message currently shown on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// What happened to a batch of selected files
#[derive(Debug, Default)]
pub struct AddReport {
    pub added_files: Vec<FileId>,
    pub added_entries: usize,
    /// Names of files refused by the type filter
    pub rejected: Vec<String>,
    /// Files or pages that failed to decode or render
    pub failures: Vec<(String, PdfKaroError)>,
}

/// Bookkeeping kept while a request is in flight
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub token: RequestToken,
    pub default_name: String,
    pub result_route: Route,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: SubmissionTicket,
    pub request: ApiRequest,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Result stored, navigator moved to this route
    Delivered(Route),
    /// Failure recorded as the page notice; the working set is untouched
    Failed(PdfKaroError),
    /// A newer submission or a navigation superseded this one
    Stale,
}

pub struct ToolPage<R> {
    tool: Tool,
    renderer: R,
    files: Vec<UploadedFile>,
    pages: WorkingSet<PageEntry>,
    project_files: WorkingSet<ProjectFile>,
    selection: BTreeSet<EntryId>,
    notice: Option<Notice>,
    busy: bool,
    tracker: RequestTracker,
    next_file: u64,
    next_entry: u64,
}

impl<R: PdfRenderer> ToolPage<R> {
    pub fn new(tool: Tool, renderer: R) -> Self {
        Self {
            tool,
            renderer,
            files: Vec::new(),
            pages: WorkingSet::new(),
            project_files: WorkingSet::new(),
            selection: BTreeSet::new(),
            notice: None,
            busy: false,
            tracker: RequestTracker::new(),
            next_file: 0,
            next_entry: 0,
        }
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Change mode or options (quality vs size, single vs zip...)
    pub fn set_tool(&mut self, tool: Tool) -> Result<(), PdfKaroError> {
        if tool.route() != self.tool.route() {
            return Err(PdfKaroError::Validation(format!(
                "cannot switch a {} page to {}",
                self.tool, tool
            )));
        }
        self.tool = tool;
        Ok(())
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn pages(&self) -> &WorkingSet<PageEntry> {
        &self.pages
    }

    pub fn project_files(&self) -> &WorkingSet<ProjectFile> {
        &self.project_files
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Shared handle for invalidating in-flight requests from elsewhere
    pub fn tracker(&self) -> RequestTracker {
        self.tracker.clone()
    }

    fn set_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            message: message.into(),
        });
    }

    fn entry_id(&mut self) -> EntryId {
        let id = EntryId(self.next_entry);
        self.next_entry += 1;
        id
    }

    // ============ Selecting files ============

    /// Accept a batch of dropped or picked files
    pub fn add_files(&mut self, selected: Vec<SelectedFile>) -> AddReport {
        if !self.tool.accepts_only_pdf() {
            return self.add_project_files(selected);
        }

        let report = self.add_pdfs(selected);

        if !report.rejected.is_empty() {
            self.set_notice(
                NoticeKind::Rejected,
                format!("Only PDF files are accepted: {}", report.rejected.join(", ")),
            );
        } else if !report.failures.is_empty() {
            let names: BTreeSet<&str> = report.failures.iter().map(|(n, _)| n.as_str()).collect();
            self.set_notice(
                NoticeKind::Unreadable,
                format!(
                    "Could not process {}. Please ensure they are valid PDFs.",
                    names.into_iter().collect::<Vec<_>>().join(", ")
                ),
            );
        }

        info!(
            tool = %self.tool,
            files = report.added_files.len(),
            entries = report.added_entries,
            rejected = report.rejected.len(),
            failed = report.failures.len(),
            "files added"
        );
        report
    }

    fn add_pdfs(&mut self, selected: Vec<SelectedFile>) -> AddReport {
        let mut report = AddReport::default();

        let (accepted, rejected): (Vec<_>, Vec<_>) =
            selected.into_iter().partition(SelectedFile::is_pdf);
        for file in &rejected {
            if let Err(e) = check_pdf(file) {
                debug!(error = %e, "file rejected");
            }
        }
        report.rejected = rejected.into_iter().map(|f| f.name).collect();

        if self.tool.single_file() {
            // A new file replaces the current one, but only once it has opened
            if let Some(file) = accepted.into_iter().next() {
                if let Some(preview) = self.open_pdf(&file, &mut report) {
                    self.reset();
                    self.insert_pdf(file, preview, &mut report);
                }
            }
        } else {
            for file in accepted {
                if let Some(preview) = self.open_pdf(&file, &mut report) {
                    self.insert_pdf(file, preview, &mut report);
                }
            }
        }
        report
    }

    fn open_pdf(&self, file: &SelectedFile, report: &mut AddReport) -> Option<Preview> {
        match self.renderer.open_document(&file.bytes) {
            Ok(doc) => Some(preview_document(
                doc.as_ref(),
                &file.name,
                self.tool.thumbnail_scale(),
            )),
            Err(e) => {
                warn!(file = %file.name, error = %e, "could not open PDF");
                report.failures.push((file.name.clone(), e));
                None
            }
        }
    }

    fn insert_pdf(&mut self, file: SelectedFile, preview: Preview, report: &mut AddReport) {
        let name = unique_name(&file.name, self.files.iter().map(|f| f.name.as_str()));
        let uploaded = UploadedFile {
            id: FileId(self.next_file),
            name,
            size: file.bytes.len(),
            bytes: Arc::from(file.bytes),
            page_count: preview.page_count,
        };
        self.next_file += 1;

        for failure in preview.failures {
            report.failures.push((uploaded.name.clone(), failure));
        }

        let mut entries = Vec::with_capacity(preview.pages.len());
        for page in preview.pages {
            entries.push(PageEntry {
                id: self.entry_id(),
                source: uploaded.id,
                source_name: uploaded.name.clone(),
                page_index: page.index,
                rotation: Default::default(),
                thumbnail: Some(page.thumbnail),
            });
        }

        report.added_entries += entries.len();
        report.added_files.push(uploaded.id);
        self.pages.extend(entries);
        self.files.push(uploaded);
    }

    /// Add text files to the project exporter, keeping each file's path.
    /// Files that are not UTF-8 are rejected.
    pub fn add_project_files(&mut self, selected: Vec<SelectedFile>) -> AddReport {
        let mut report = AddReport::default();

        if self.tool.accepts_only_pdf() {
            report.rejected = selected.into_iter().map(|f| f.name).collect();
            self.set_notice(
                NoticeKind::Rejected,
                format!("{} does not take project files", self.tool),
            );
            return report;
        }

        for file in selected {
            match String::from_utf8(file.bytes) {
                Ok(content) => {
                    let id = self.entry_id();
                    self.project_files.push(ProjectFile {
                        id,
                        path: file.name,
                        content,
                    });
                    report.added_entries += 1;
                }
                Err(_) => {
                    debug!(file = %file.name, "not a text file");
                    report.rejected.push(file.name);
                }
            }
        }

        if !report.rejected.is_empty() {
            self.set_notice(
                NoticeKind::Rejected,
                format!("Only text files can be exported: {}", report.rejected.join(", ")),
            );
        }
        info!(files = report.added_entries, rejected = report.rejected.len(), "project files added");
        report
    }

    // ============ Arranging ============

    /// Stable move from one index to another; equal indices are a no-op
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), PdfKaroError> {
        if self.tool.accepts_only_pdf() {
            self.pages.move_entry(from, to)
        } else {
            self.project_files.move_entry(from, to)
        }
    }

    /// Drag `active` onto the slot held by `over`
    pub fn move_by_id(&mut self, active: EntryId, over: EntryId) -> Result<(), PdfKaroError> {
        if self.tool.accepts_only_pdf() {
            self.pages.move_by_id(active, over)
        } else {
            self.project_files.move_by_id(active, over)
        }
    }

    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), PdfKaroError> {
        if self.tool.accepts_only_pdf() {
            self.pages.reorder(new_order)
        } else {
            self.project_files.reorder(new_order)
        }
    }

    pub fn rotate(&mut self, id: EntryId) -> Result<(), PdfKaroError> {
        self.pages.rotate(id)
    }

    pub fn remove(&mut self, id: EntryId) -> Result<(), PdfKaroError> {
        if self.tool.accepts_only_pdf() {
            self.pages.remove(id)?;
            self.selection.remove(&id);
        } else {
            self.project_files.remove(id)?;
        }
        Ok(())
    }

    /// Clear everything the user has selected or arranged
    pub fn reset(&mut self) {
        self.files.clear();
        self.pages.clear();
        self.project_files.clear();
        self.selection.clear();
        self.notice = None;
    }

    // ============ Split selection ============

    pub fn toggle_selection(&mut self, id: EntryId) -> Result<bool, PdfKaroError> {
        if self.pages.get(id).is_none() {
            return Err(PdfKaroError::UnknownEntry(id.0));
        }
        if self.selection.remove(&id) {
            Ok(false)
        } else {
            self.selection.insert(id);
            Ok(true)
        }
    }

    /// Select pages by 1-indexed ranges such as `"1-3, 5"`, replacing the
    /// current selection
    pub fn select_ranges(&mut self, input: &str) -> Result<(), PdfKaroError> {
        let numbers = parse_ranges(input)?;
        let page_count = self.files.first().map(|f| f.page_count).unwrap_or(0);

        let mut selection = BTreeSet::new();
        for number in numbers {
            if number == 0 || number > page_count {
                return Err(PdfKaroError::InvalidRange(format!(
                    "Page {} is out of range (1-{})",
                    number, page_count
                )));
            }
            let entry = self
                .pages
                .iter()
                .find(|p| p.page_index == number - 1)
                .ok_or_else(|| {
                    PdfKaroError::InvalidRange(format!("Page {} has no preview", number))
                })?;
            selection.insert(entry.id);
        }

        self.selection = selection;
        Ok(())
    }

    pub fn is_selected(&self, id: EntryId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_pages(&self) -> Vec<&PageEntry> {
        self.pages
            .iter()
            .filter(|p| self.selection.contains(&p.id))
            .collect()
    }

    // ============ Submitting ============

    fn build_request(&self) -> Result<(ApiRequest, String), PdfKaroError> {
        match &self.tool {
            Tool::Merge | Tool::Compress(_) => {
                let request = build_page_request(&self.tool, self.pages.as_slice(), &self.files)?;
                Ok((request, self.tool.default_file_name(true)))
            }
            Tool::Split => {
                let file = self.files.first().ok_or_else(|| {
                    PdfKaroError::Validation("Please select a PDF file to split".into())
                })?;
                let selected: Vec<PageEntry> =
                    self.selected_pages().into_iter().cloned().collect();
                let request = build_split_request(file, &selected)?;
                Ok((request, self.tool.default_file_name(!selected.is_empty())))
            }
            Tool::ProjectExport(options) => {
                let request = build_export_request(options, self.project_files.as_slice())?;
                Ok((request, self.tool.default_file_name(false)))
            }
        }
    }

    /// Validate and build the request for the current working set.
    ///
    /// Begins a new request token, so any submission still in flight becomes
    /// stale. Validation failures set the notice and make no request.
    pub fn prepare_submission(&mut self) -> Result<Submission, PdfKaroError> {
        let (request, default_name) = match self.build_request() {
            Ok(built) => built,
            Err(e) => {
                warn!(tool = %self.tool, error = %e, "submission rejected before sending");
                self.set_notice(NoticeKind::Validation, e.to_string());
                return Err(e);
            }
        };

        let token = self.tracker.begin();
        self.busy = true;
        self.notice = None;
        info!(tool = %self.tool, endpoint = request.endpoint, generation = token.generation(), "submitting");

        Ok(Submission {
            ticket: SubmissionTicket {
                token,
                default_name,
                result_route: self.tool.result_route(),
            },
            request,
        })
    }

    /// Request for a single page of the split source, for per-page download
    pub fn extract_page_request(&self, page_index: u32) -> Result<ApiRequest, PdfKaroError> {
        let file = self
            .files
            .first()
            .ok_or_else(|| PdfKaroError::Validation("No file loaded".into()))?;
        build_extract_page_request(file, page_index)
    }

    /// Apply the outcome of a request started by [`prepare_submission`](Self::prepare_submission)
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<ApiResponse, PdfKaroError>,
        blobs: &BlobStore,
        nav: &mut Navigator,
    ) -> SubmissionOutcome {
        if !self.tracker.is_current(ticket.token) {
            debug!(generation = ticket.token.generation(), "discarding stale response");
            return SubmissionOutcome::Stale;
        }
        self.busy = false;

        let output = match outcome.and_then(interpret_response) {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %self.tool, error = %e, "submission failed");
                self.set_notice(
                    NoticeKind::Submission,
                    format!("An error occurred while processing your files: {}", e),
                );
                return SubmissionOutcome::Failed(e);
            }
        };

        let file_name = output
            .suggested_name
            .clone()
            .unwrap_or(ticket.default_name);
        info!(tool = %self.tool, file = %file_name, size = output.bytes.len(), "result received");

        let object_url = blobs.create(output.bytes, output.content_type);
        let state = ResultState {
            object_url,
            file_name,
            origin: self.tool.route(),
        };
        nav.navigate(ticket.result_route.clone(), Some(state));
        SubmissionOutcome::Delivered(ticket.result_route)
    }

    /// Prepare, send and complete in one go
    pub async fn submit<T>(
        &mut self,
        transport: &T,
        blobs: &BlobStore,
        nav: &mut Navigator,
    ) -> SubmissionOutcome
    where
        T: ApiTransport + ?Sized,
    {
        let Submission { ticket, request } = match self.prepare_submission() {
            Ok(submission) => submission,
            Err(e) => return SubmissionOutcome::Failed(e),
        };
        let outcome = transport.send(request).await;
        self.complete_submission(ticket, outcome, blobs, nav)
    }

    /// Navigate away; anything still in flight is abandoned
    pub fn leave(&mut self, nav: &mut Navigator, to: Route) {
        self.tracker.invalidate();
        self.busy = false;
        nav.navigate(to, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::PDF_MIME;
    use crate::page::{Rotation, Thumbnail};
    use crate::render::{MupdfRenderer, PdfDocument};
    use crate::request::{PageInstruction, RequestBody};
    use crate::testing::create_test_pdf;
    use crate::tool::{CompressMode, ExportOptions};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn pdf(name: &str, pages: u32) -> SelectedFile {
        SelectedFile::new(name, Some(PDF_MIME), create_test_pdf(pages, name))
    }

    fn labels(page: &ToolPage<MupdfRenderer>) -> Vec<String> {
        page.pages()
            .iter()
            .map(|p| format!("{}{}", &p.source_name[..1].to_uppercase(), p.page_index))
            .collect()
    }

    /// Records every request and answers with a canned response
    struct FakeApi {
        requests: Mutex<Vec<ApiRequest>>,
        response: Result<ApiResponse, PdfKaroError>,
    }

    impl FakeApi {
        fn replying(status: u16, body: &[u8]) -> Self {
            Self {
                requests: Mutex::new(vec![]),
                response: Ok(ApiResponse {
                    status,
                    content_type: Some("application/pdf".into()),
                    content_disposition: None,
                    body: body.to_vec(),
                }),
            }
        }

        fn sent(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ApiTransport for FakeApi {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, PdfKaroError> {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    #[test]
    fn test_pages_listed_in_file_then_page_order() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        let report = page.add_files(vec![pdf("a.pdf", 3), pdf("b.pdf", 2)]);

        assert_eq!(report.added_entries, 5);
        assert_eq!(labels(&page), vec!["A0", "A1", "A2", "B0", "B1"]);
        assert!(page.notice().is_none());
        assert!(page.pages().iter().all(|p| p.thumbnail.is_some()));
    }

    #[tokio::test]
    async fn test_merge_scenario_drag_and_submit() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 3), pdf("b.pdf", 2)]);

        page.move_entry(3, 0).unwrap();
        assert_eq!(labels(&page), vec!["B0", "A0", "A1", "A2", "B1"]);

        let api = FakeApi::replying(200, b"%PDF-merged");
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Merge);
        let outcome = page.submit(&api, &blobs, &mut nav).await;

        assert!(matches!(outcome, SubmissionOutcome::Delivered(Route::MergeComplete)));
        assert_eq!(api.sent(), 1);

        let request = api.requests.lock().unwrap()[0].clone();
        assert_eq!(request.file_names("files"), vec!["a.pdf", "b.pdf"]);
        let instructions: Vec<PageInstruction> =
            serde_json::from_str(request.text_field("pages_data").unwrap()).unwrap();
        let order: Vec<_> = instructions
            .iter()
            .map(|i| (i.source_file.as_str(), i.page_index))
            .collect();
        assert_eq!(
            order,
            vec![("b.pdf", 0), ("a.pdf", 0), ("a.pdf", 1), ("a.pdf", 2), ("b.pdf", 1)]
        );

        assert_eq!(nav.current(), &Route::MergeComplete);
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn test_non_pdf_rejected_without_request() {
        let mut page = ToolPage::new(Tool::Compress(CompressMode::Quality(50)), MupdfRenderer);
        let report = page.add_files(vec![SelectedFile::new(
            "holiday.png",
            Some("image/png"),
            vec![0x89, b'P', b'N', b'G'],
        )]);

        assert_eq!(report.rejected, vec!["holiday.png"]);
        assert!(page.pages().is_empty());
        assert_eq!(page.notice().unwrap().kind, NoticeKind::Rejected);

        let api = FakeApi::replying(200, b"%PDF-");
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Compress);
        let outcome = page.submit(&api, &blobs, &mut nav).await;
        assert!(matches!(outcome, SubmissionOutcome::Failed(PdfKaroError::Validation(_))));
        assert_eq!(api.sent(), 0);
    }

    #[tokio::test]
    async fn test_server_error_keeps_working_set() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        page.rotate(page.pages().as_slice()[1].id).unwrap();

        let api = FakeApi::replying(500, br#"{"detail":"boom"}"#);
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Merge);
        let outcome = page.submit(&api, &blobs, &mut nav).await;

        assert!(matches!(
            outcome,
            SubmissionOutcome::Failed(PdfKaroError::Server { status: 500, .. })
        ));
        let notice = page.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Submission);
        assert!(notice.message.contains("boom"));
        assert!(!page.is_busy());
        assert_eq!(page.pages().len(), 2);
        assert_eq!(page.pages().as_slice()[1].rotation, Rotation::Deg90);
        assert_eq!(nav.current(), &Route::Merge);
        assert!(blobs.is_empty());

        // resubmittable
        let retry = FakeApi::replying(200, b"%PDF-ok");
        let outcome = page.submit(&retry, &blobs, &mut nav).await;
        assert!(matches!(outcome, SubmissionOutcome::Delivered(_)));
        assert!(page.notice().is_none());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Merge);

        let first = page.prepare_submission().unwrap();
        let second = page.prepare_submission().unwrap();

        let ok = |body: &[u8]| {
            Ok(ApiResponse {
                status: 200,
                content_type: Some("application/pdf".into()),
                content_disposition: None,
                body: body.to_vec(),
            })
        };

        let late = page.complete_submission(first.ticket, ok(b"%PDF-old"), &blobs, &mut nav);
        assert!(matches!(late, SubmissionOutcome::Stale));
        assert!(blobs.is_empty());
        assert!(page.is_busy());

        let fresh = page.complete_submission(second.ticket, ok(b"%PDF-new"), &blobs, &mut nav);
        assert!(matches!(fresh, SubmissionOutcome::Delivered(_)));
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn test_leaving_page_abandons_request() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Merge);

        let pending = page.prepare_submission().unwrap();
        page.leave(&mut nav, Route::Home);

        let outcome = page.complete_submission(
            pending.ticket,
            Err(PdfKaroError::Transport("connection reset".into())),
            &blobs,
            &mut nav,
        );
        assert!(matches!(outcome, SubmissionOutcome::Stale));
        assert!(page.notice().is_none());
        assert_eq!(nav.current(), &Route::Home);
    }

    #[test]
    fn test_server_suggested_name_wins() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Merge);

        let pending = page.prepare_submission().unwrap();
        page.complete_submission(
            pending.ticket,
            Ok(ApiResponse {
                status: 200,
                content_type: Some("application/pdf".into()),
                content_disposition: Some("attachment; filename=server_name.pdf".into()),
                body: b"%PDF-".to_vec(),
            }),
            &blobs,
            &mut nav,
        );
        let state = nav.take_state().unwrap();
        assert_eq!(state.file_name, "server_name.pdf");
        assert_eq!(state.origin, Route::Merge);
    }

    #[test]
    fn test_dot_dot_suggestion_falls_back_to_default_name() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        let blobs = BlobStore::new();
        let mut nav = Navigator::new(Route::Merge);

        let pending = page.prepare_submission().unwrap();
        let default_name = pending.ticket.default_name.clone();
        page.complete_submission(
            pending.ticket,
            Ok(ApiResponse {
                status: 200,
                content_type: Some("application/pdf".into()),
                content_disposition: Some(r#"attachment; filename="..""#.into()),
                body: b"%PDF-".to_vec(),
            }),
            &blobs,
            &mut nav,
        );
        assert_eq!(nav.take_state().unwrap().file_name, default_name);
    }

    #[test]
    fn test_duplicate_names_are_disambiguated() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 1), pdf("a.pdf", 2)]);

        let names: Vec<_> = page.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "a (1).pdf"]);

        let request = page.prepare_submission().unwrap().request;
        assert_eq!(request.file_names("files"), vec!["a.pdf", "a (1).pdf"]);
    }

    #[test]
    fn test_unreadable_file_does_not_block_others() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        let broken = SelectedFile::new("broken.pdf", Some(PDF_MIME), b"%PDF-1.7 garbage".to_vec());
        let report = page.add_files(vec![broken, pdf("good.pdf", 2)]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "broken.pdf");
        assert_eq!(page.pages().len(), 2);
        assert_eq!(page.notice().unwrap().kind, NoticeKind::Unreadable);
    }

    /// Renderer whose documents fail on one page index
    struct PartlyBroken;

    struct PartlyBrokenDoc;

    impl PdfDocument for PartlyBrokenDoc {
        fn page_count(&self) -> u32 {
            3
        }

        fn render_page(&self, index: u32, _scale: f32) -> Result<Thumbnail, PdfKaroError> {
            if index == 1 {
                return Err(PdfKaroError::RenderError {
                    page: index,
                    reason: "bad stream".into(),
                });
            }
            Ok(Thumbnail {
                width: 1,
                height: 1,
                png: vec![],
            })
        }
    }

    impl PdfRenderer for PartlyBroken {
        fn open_document(&self, _bytes: &[u8]) -> Result<Box<dyn PdfDocument>, PdfKaroError> {
            Ok(Box::new(PartlyBrokenDoc))
        }
    }

    #[test]
    fn test_failed_page_dropped_file_kept() {
        let mut page = ToolPage::new(Tool::Compress(CompressMode::Quality(60)), PartlyBroken);
        let report = page.add_files(vec![pdf("x.pdf", 3)]);

        let indices: Vec<_> = page.pages().iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(page.files().len(), 1);
        assert_eq!(page.files()[0].page_count, 3);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_split_selection_and_replacement() {
        let mut page = ToolPage::new(Tool::Split, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 5), pdf("b.pdf", 2)]);
        assert_eq!(page.files().len(), 1);
        assert_eq!(page.pages().len(), 5);

        page.select_ranges("2, 4-5").unwrap();
        let ids: Vec<_> = page.pages().iter().map(|p| p.id).collect();
        page.rotate(ids[3]).unwrap();
        assert!(!page.toggle_selection(ids[4]).unwrap());

        let request = page.prepare_submission().unwrap();
        assert_eq!(request.ticket.default_name, "extracted_pages.pdf");
        assert_eq!(
            request.request.text_field("pages_to_extract"),
            Some(r#"[{"pageIndex":1,"rotation":0},{"pageIndex":3,"rotation":90}]"#)
        );

        assert!(page.select_ranges("9").is_err());

        page.add_files(vec![pdf("c.pdf", 2)]);
        assert_eq!(page.files()[0].name, "c.pdf");
        assert!(page.selected_pages().is_empty());
    }

    #[test]
    fn test_split_keeps_loaded_file_when_replacement_is_broken() {
        let mut page = ToolPage::new(Tool::Split, MupdfRenderer);
        page.add_files(vec![pdf("good.pdf", 3)]);
        page.select_ranges("2").unwrap();

        let broken = SelectedFile::new("broken.pdf", Some(PDF_MIME), b"%PDF-1.7 garbage".to_vec());
        let report = page.add_files(vec![broken]);

        assert_eq!(report.failures.len(), 1);
        assert!(report.added_files.is_empty());
        assert_eq!(page.files().len(), 1);
        assert_eq!(page.files()[0].name, "good.pdf");
        assert_eq!(page.pages().len(), 3);
        assert_eq!(page.selected_pages().len(), 1);
        assert_eq!(page.notice().unwrap().kind, NoticeKind::Unreadable);
    }

    #[test]
    fn test_uploaded_file_records_size() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        let file = pdf("sized.pdf", 2);
        let expected = file.bytes.len();
        page.add_files(vec![file]);

        let uploaded = &page.files()[0];
        assert_eq!(uploaded.size, expected);
        assert_eq!(uploaded.size, uploaded.bytes.len());
        assert_eq!(uploaded.page_count, 2);
    }

    #[test]
    fn test_split_without_file_is_validation_error() {
        let mut page = ToolPage::new(Tool::Split, MupdfRenderer);
        assert!(page.prepare_submission().is_err());
        assert_eq!(page.notice().unwrap().kind, NoticeKind::Validation);
        assert!(!page.is_busy());
    }

    #[test]
    fn test_project_export_flow() {
        let mut page = ToolPage::new(Tool::ProjectExport(ExportOptions::default()), MupdfRenderer);
        page.add_files(vec![
            SelectedFile::new("src/main.rs", None, b"fn main() {}".to_vec()),
            SelectedFile::new("README.md", None, b"# demo".to_vec()),
            SelectedFile::new("logo.bin", None, vec![0xFF, 0xFE, 0x00]),
        ]);
        assert_eq!(page.project_files().len(), 2);
        assert_eq!(page.notice().unwrap().kind, NoticeKind::Rejected);

        page.move_entry(1, 0).unwrap();
        let submission = page.prepare_submission().unwrap();
        assert_eq!(submission.request.endpoint, "/api/v1/project-exporter/single");
        assert_eq!(submission.ticket.default_name, "project_export.txt");
        match submission.request.body {
            RequestBody::Json(json) => {
                assert_eq!(json["files"][0]["path"], "README.md");
                assert_eq!(json["files"][1]["path"], "src/main.rs");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_and_reset() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        page.add_files(vec![pdf("a.pdf", 2), pdf("b.pdf", 1)]);
        let first = page.pages().as_slice()[0].id;
        page.remove(first).unwrap();
        assert_eq!(labels(&page), vec!["A1", "B0"]);
        assert!(page.remove(first).is_err());

        page.reset();
        assert!(page.pages().is_empty());
        assert!(page.files().is_empty());
    }

    #[test]
    fn test_project_files_refused_by_pdf_tool() {
        let mut page = ToolPage::new(Tool::Merge, MupdfRenderer);
        let report =
            page.add_project_files(vec![SelectedFile::new("notes.md", None, b"# hi".to_vec())]);
        assert_eq!(report.rejected, vec!["notes.md"]);
        assert!(page.project_files().is_empty());
        assert_eq!(page.notice().unwrap().kind, NoticeKind::Rejected);
    }

    #[test]
    fn test_set_tool_keeps_page_kind() {
        let mut page = ToolPage::new(Tool::Compress(CompressMode::Quality(50)), MupdfRenderer);
        assert!(page.set_tool(Tool::Compress(CompressMode::Quality(80))).is_ok());
        assert!(page.set_tool(Tool::Merge).is_err());
    }
}
