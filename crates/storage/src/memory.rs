//! In-process backend for tests and ephemeral sessions.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StorageError;
use crate::traits::HistoryBackend;

/// Keeps the document in memory. Clones share the same document, so a test
/// can hand one clone to a store and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    document: Mutex<Option<String>>,
    quarantined: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with a document, as if written by an earlier run.
    #[must_use]
    pub fn with_document(document: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.lock_document() = Some(document.into());
        backend
    }

    /// Make subsequent writes fail with [`StorageError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.lock_document().clone()
    }

    #[must_use]
    pub fn quarantined(&self) -> Option<String> {
        self.inner.quarantined.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn lock_document(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.document())
    }

    fn write(&self, document: &str) -> Result<(), StorageError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory backend writes disabled".to_owned()));
        }
        *self.lock_document() = Some(document.to_owned());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn quarantine(&self) -> Result<(), StorageError> {
        let taken = self.lock_document().take();
        *self.inner.quarantined.lock().unwrap_or_else(PoisonError::into_inner) = taken;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
