//! Result / download page

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::blob::{Blob, ObjectUrl};
use crate::error::PdfKaroError;
use crate::file::unique_name;
use crate::navigation::{Navigator, ResultState, Route};

/// Platform share capability (system share sheet, clipboard, ...)
pub trait ShareTarget {
    fn share(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<(), PdfKaroError>;
}

/// How a result reached the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Shared,
    Saved(PathBuf),
}

/// A mounted result page. Owns the object URL; dropping the page revokes it.
#[derive(Debug)]
pub struct ResultPage {
    route: Route,
    state: ResultState,
}

impl ResultPage {
    /// Mount the page at the navigator's current route.
    ///
    /// Without navigation state (a reload, a typed URL) there is nothing to
    /// show: the navigator is redirected to the fallback tool page and that
    /// route is returned as the error.
    pub fn mount(nav: &mut Navigator) -> Result<Self, Route> {
        let route = nav.current().clone();
        match nav.take_state() {
            Some(state) => Ok(Self { route, state }),
            None => {
                let target = route.fallback();
                warn!(route = %route, redirect = %target, "no result state, redirecting");
                nav.navigate(target.clone(), None);
                Err(target)
            }
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn origin(&self) -> &Route {
        &self.state.origin
    }

    pub fn file_name(&self) -> &str {
        &self.state.file_name
    }

    pub fn object_url(&self) -> &ObjectUrl {
        self.state.object_url.url()
    }

    pub fn blob(&self) -> Result<Arc<Blob>, PdfKaroError> {
        self.state
            .object_url
            .blob()
            .ok_or_else(|| PdfKaroError::Validation("Result is no longer available".into()))
    }

    /// Other tools offered as a next step
    pub fn continue_to(&self) -> Vec<Route> {
        [Route::Merge, Route::Split, Route::Compress]
            .into_iter()
            .filter(|r| *r != self.state.origin)
            .collect()
    }

    /// Share when a share target is available, else save into `dir`.
    /// A failed share falls back to saving.
    pub fn deliver(
        &self,
        share: Option<&dyn ShareTarget>,
        dir: &Path,
    ) -> Result<Delivery, PdfKaroError> {
        let blob = self.blob()?;

        if let Some(target) = share {
            match target.share(self.file_name(), &blob.content_type, &blob.bytes) {
                Ok(()) => {
                    info!(file = self.file_name(), "result shared");
                    return Ok(Delivery::Shared);
                }
                Err(e) => warn!(error = %e, "share failed, saving instead"),
            }
        }

        self.save_into(&blob, dir).map(Delivery::Saved)
    }

    /// Save under the suggested name without clobbering an existing file
    fn save_into(&self, blob: &Blob, dir: &Path) -> Result<PathBuf, PdfKaroError> {
        let existing: Vec<String> = std::fs::read_dir(dir)
            .map_err(|e| PdfKaroError::Io(format!("Cannot read {}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        let name = unique_name(self.file_name(), existing.iter().map(String::as_str));
        let path = dir.join(name);
        std::fs::write(&path, &blob.bytes)
            .map_err(|e| PdfKaroError::Io(format!("Cannot write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), size = blob.bytes.len(), "result saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobStore;
    use std::cell::RefCell;

    struct RecordingShare {
        shared: RefCell<Vec<String>>,
        fail: bool,
    }

    impl ShareTarget for RecordingShare {
        fn share(&self, file_name: &str, _ct: &str, _bytes: &[u8]) -> Result<(), PdfKaroError> {
            if self.fail {
                return Err(PdfKaroError::Validation("share sheet dismissed".into()));
            }
            self.shared.borrow_mut().push(file_name.to_string());
            Ok(())
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pdfkaro-result-{}-{}", tag, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn navigate_with_result(store: &BlobStore, nav: &mut Navigator) {
        nav.navigate(
            Route::CompressComplete,
            Some(ResultState {
                object_url: store.create(b"%PDF-small".to_vec(), "application/pdf"),
                file_name: "compressed_by_PDFkaro.in.pdf".into(),
                origin: Route::Compress,
            }),
        );
    }

    #[test]
    fn test_mount_without_state_redirects() {
        let mut nav = Navigator::new(Route::Download);
        let redirect = ResultPage::mount(&mut nav).unwrap_err();
        assert_eq!(redirect, Route::Merge);
        assert_eq!(nav.current(), &Route::Merge);
    }

    #[test]
    fn test_dropping_page_revokes_url() {
        let store = BlobStore::new();
        let mut nav = Navigator::new(Route::Compress);
        navigate_with_result(&store, &mut nav);

        let page = ResultPage::mount(&mut nav).unwrap();
        assert_eq!(page.origin(), &Route::Compress);
        assert_eq!(page.continue_to(), vec![Route::Merge, Route::Split]);
        assert_eq!(store.len(), 1);

        drop(page);
        assert!(store.is_empty());
    }

    #[test]
    fn test_share_preferred_when_available() {
        let store = BlobStore::new();
        let mut nav = Navigator::new(Route::Compress);
        navigate_with_result(&store, &mut nav);
        let page = ResultPage::mount(&mut nav).unwrap();

        let share = RecordingShare {
            shared: RefCell::new(vec![]),
            fail: false,
        };
        let dir = temp_dir("share");
        assert_eq!(page.deliver(Some(&share as &dyn ShareTarget), &dir).unwrap(), Delivery::Shared);
        assert_eq!(share.shared.borrow().as_slice(), ["compressed_by_PDFkaro.in.pdf"]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_failed_share_falls_back_to_save() {
        let store = BlobStore::new();
        let mut nav = Navigator::new(Route::Compress);
        navigate_with_result(&store, &mut nav);
        let page = ResultPage::mount(&mut nav).unwrap();

        let share = RecordingShare {
            shared: RefCell::new(vec![]),
            fail: true,
        };
        let dir = temp_dir("fallback");
        let first = page.deliver(Some(&share as &dyn ShareTarget), &dir).unwrap();
        let second = page.deliver(None, &dir).unwrap();

        assert_eq!(first, Delivery::Saved(dir.join("compressed_by_PDFkaro.in.pdf")));
        assert_eq!(second, Delivery::Saved(dir.join("compressed_by_PDFkaro.in (1).pdf")));
        assert_eq!(std::fs::read(dir.join("compressed_by_PDFkaro.in.pdf")).unwrap(), b"%PDF-small");
        let _ = std::fs::remove_dir_all(dir);
    }
}
