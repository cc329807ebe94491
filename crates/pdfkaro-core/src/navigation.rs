//! Routes and in-memory navigation state
//!
//! Results travel between pages as navigation state, never as a URL
//! parameter: reloading a result route directly finds no state.

use std::fmt;

use tracing::debug;

use crate::blob::ObjectUrlHandle;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Merge,
    Split,
    Compress,
    ProjectExporter,
    MergeComplete,
    SplitComplete,
    CompressComplete,
    Download,
    NotFound(String),
}

impl Route {
    pub fn resolve(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/merge" => Route::Merge,
            "/split" => Route::Split,
            "/compress" => Route::Compress,
            "/project-exporter" => Route::ProjectExporter,
            "/merge-complete" => Route::MergeComplete,
            "/split-complete" => Route::SplitComplete,
            "/compress-complete" => Route::CompressComplete,
            "/download" => Route::Download,
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::Merge => "/merge",
            Route::Split => "/split",
            Route::Compress => "/compress",
            Route::ProjectExporter => "/project-exporter",
            Route::MergeComplete => "/merge-complete",
            Route::SplitComplete => "/split-complete",
            Route::CompressComplete => "/compress-complete",
            Route::Download => "/download",
            Route::NotFound(path) => path,
        }
    }

    /// Where a result page sends the user when it has nothing to show
    pub fn fallback(&self) -> Route {
        match self {
            Route::SplitComplete => Route::Split,
            Route::CompressComplete => Route::Compress,
            Route::MergeComplete | Route::Download => Route::Merge,
            _ => Route::Home,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// State handed from a tool page to its result page
#[derive(Debug)]
pub struct ResultState {
    pub object_url: ObjectUrlHandle,
    pub file_name: String,
    /// The tool page that produced the result
    pub origin: Route,
}

#[derive(Debug)]
pub struct Navigator {
    current: Route,
    state: Option<ResultState>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            state: None,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// Go to `route`. Any state not picked up by the previous page is dropped
    /// here, which revokes its object URL.
    pub fn navigate(&mut self, route: Route, state: Option<ResultState>) {
        debug!(from = %self.current, to = %route, with_state = state.is_some(), "navigate");
        self.current = route;
        self.state = state;
    }

    /// Navigate by path, as a link or typed URL would
    pub fn open(&mut self, path: &str) {
        self.navigate(Route::resolve(path), None);
    }

    /// Hand the pending state to the page mounting now
    pub fn take_state(&mut self) -> Option<ResultState> {
        self.state.take()
    }

    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }
}
