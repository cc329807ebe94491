//! Request tokens
//!
//! Every submission takes a token. Starting another submission, or leaving
//! the page, moves the tracker on; a response that arrives carrying an
//! older token is stale and gets ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    generation: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, invalidating all earlier tokens
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate outstanding tokens without starting a request
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }
}
