//! Append-only analysis history.

use std::collections::BTreeMap;
use std::path::PathBuf;

use delivery_guard_core::{AnalysisResult, HistoryItem};

use crate::backend::JsonFileBackend;
use crate::error::StorageError;
use crate::traits::HistoryBackend;
use crate::types::HistorySnapshot;

/// Ordered summaries plus a map of full reports, mirrored to a backend.
///
/// The id set of `history` always equals the key set of `results`.
/// In-memory state is authoritative: if a write fails the entry stays in
/// memory and [`HistoryStore::persist`] can be retried.
pub struct HistoryStore {
    backend: Box<dyn HistoryBackend>,
    history: Vec<HistoryItem>,
    results: BTreeMap<String, AnalysisResult>,
    dirty: bool,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("backend", &self.backend.describe())
            .field("entries", &self.history.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl HistoryStore {
    /// Hydrates the store from `backend`.
    ///
    /// A missing document yields an empty store. An unreadable, unparseable or
    /// inconsistent document (see [`HistorySnapshot::verify`]) also yields an
    /// empty store: it is logged and,
    /// where possible, moved aside rather than surfaced as an error.
    pub fn load(backend: impl HistoryBackend + 'static) -> Self {
        Self::hydrate(backend, true)
    }

    /// Like [`HistoryStore::load`], but leaves a corrupt document where it is.
    /// For callers that only read.
    pub fn peek(backend: impl HistoryBackend + 'static) -> Self {
        Self::hydrate(backend, false)
    }

    /// Hydrates from a JSON document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::load(JsonFileBackend::new(path))
    }

    /// [`HistoryStore::peek`] on the JSON document at `path`.
    pub fn peek_file(path: impl Into<PathBuf>) -> Self {
        Self::peek(JsonFileBackend::new(path))
    }

    fn hydrate(backend: impl HistoryBackend + 'static, quarantine: bool) -> Self {
        let snapshot = read_snapshot(&backend, quarantine);
        tracing::info!(
            location = %backend.describe(),
            entries = snapshot.history.len(),
            "loaded analysis history"
        );
        Self {
            backend: Box::new(backend),
            history: snapshot.history,
            results: snapshot.results,
            dirty: false,
        }
    }

    /// Summaries, most recent first.
    #[must_use]
    pub fn items(&self) -> &[HistoryItem] {
        &self.history
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AnalysisResult> {
        self.results.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.results.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Whether in-memory state holds entries the backend has not accepted yet.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot { history: self.history.clone(), results: self.results.clone() }
    }

    /// Prepends a summary of `result`, stores the body and persists both in
    /// one write.
    ///
    /// # Errors
    /// [`StorageError::Duplicate`] if the id is already present (nothing
    /// changes). A persistence error is returned after the entry has been
    /// kept in memory.
    pub fn append(&mut self, result: AnalysisResult) -> Result<HistoryItem, StorageError> {
        if self.results.contains_key(&result.id) {
            return Err(StorageError::Duplicate(result.id));
        }

        let item = HistoryItem::from(&result);
        self.history.insert(0, item.clone());
        self.results.insert(result.id.clone(), result);
        self.dirty = true;

        self.persist().inspect_err(|e| {
            tracing::error!(id = %item.id, error = %e, "history write failed; entry kept in memory");
        })?;
        Ok(item)
    }

    /// Writes the current state to the backend.
    ///
    /// # Errors
    /// Returns the backend's error; the store stays dirty.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        let document = serde_json::to_string(&self.snapshot())?;
        self.backend.write(&document)?;
        self.dirty = false;
        Ok(())
    }
}

fn read_snapshot(backend: &dyn HistoryBackend, quarantine: bool) -> HistorySnapshot {
    let document = match backend.read() {
        Ok(Some(document)) => document,
        Ok(None) => return HistorySnapshot::default(),
        Err(e) => {
            tracing::warn!(error = %e, "history unreadable, starting empty");
            return HistorySnapshot::default();
        },
    };

    let reason = match serde_json::from_str::<HistorySnapshot>(&document) {
        Ok(snapshot) => match snapshot.verify() {
            Ok(()) => return snapshot,
            Err(reason) => reason,
        },
        Err(e) => e.to_string(),
    };

    tracing::warn!(location = %backend.describe(), %reason, "corrupt history, starting empty");
    if !quarantine {
        return HistorySnapshot::default();
    }
    if let Err(e) = backend.quarantine() {
        tracing::warn!(error = %e, "could not move corrupt history aside");
    }
    HistorySnapshot::default()
}
