//! In-memory blob store with object URLs
//!
//! A job result lives here for the length of a session. Whoever holds the
//! [`ObjectUrlHandle`] owns the blob; dropping the handle revokes the URL and
//! frees the bytes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    fn generate() -> Self {
        Self(format!("blob:pdfkaro/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    blobs: Arc<Mutex<HashMap<ObjectUrl, Arc<Blob>>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectUrl, Arc<Blob>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `bytes` and hand back the owning handle
    pub fn create(&self, bytes: Vec<u8>, content_type: impl Into<String>) -> ObjectUrlHandle {
        let url = ObjectUrl::generate();
        let blob = Blob {
            bytes,
            content_type: content_type.into(),
        };
        debug!(url = %url, size = blob.bytes.len(), "object URL created");
        self.lock().insert(url.clone(), Arc::new(blob));
        ObjectUrlHandle {
            url,
            store: self.clone(),
        }
    }

    pub fn get(&self, url: &ObjectUrl) -> Option<Arc<Blob>> {
        self.lock().get(url).cloned()
    }

    /// Release a URL; returns whether it was still live
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.lock().remove(url).is_some();
        if removed {
            debug!(url = %url, "object URL revoked");
        }
        removed
    }

    /// Number of live object URLs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owning reference to a stored blob; revokes on drop
#[derive(Debug)]
pub struct ObjectUrlHandle {
    url: ObjectUrl,
    store: BlobStore,
}

impl ObjectUrlHandle {
    pub fn url(&self) -> &ObjectUrl {
        &self.url
    }

    pub fn blob(&self) -> Option<Arc<Blob>> {
        self.store.get(&self.url)
    }
}

impl Drop for ObjectUrlHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_drop_revokes() {
        let store = BlobStore::new();
        let handle = store.create(b"%PDF-1.7".to_vec(), "application/pdf");
        let url = handle.url().clone();
        assert!(url.as_str().starts_with("blob:pdfkaro/"));
        assert_eq!(store.len(), 1);
        assert_eq!(handle.blob().unwrap().bytes, b"%PDF-1.7");

        drop(handle);
        assert!(store.is_empty());
        assert!(store.get(&url).is_none());
    }

    #[test]
    fn test_revoke_twice() {
        let store = BlobStore::new();
        let handle = store.create(vec![1], "application/zip");
        assert!(store.revoke(handle.url()));
        assert!(!store.revoke(handle.url()));
    }

    #[test]
    fn test_urls_are_distinct() {
        let store = BlobStore::new();
        let a = store.create(vec![], "application/pdf");
        let b = store.create(vec![], "application/pdf");
        assert_ne!(a.url(), b.url());
        assert_eq!(store.len(), 2);
    }
}
