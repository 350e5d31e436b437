//! Storage backend trait abstraction
//!
//! A backend stores one opaque document. Encoding and the history
//! invariants live in [`crate::HistoryStore`]; backends only guarantee that a
//! write replaces the previous document as a whole or not at all.

use crate::error::StorageError;

pub trait HistoryBackend: Send + Sync {
    /// Read the stored document. `Ok(None)` if nothing was ever written.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Atomically replace the stored document.
    fn write(&self, document: &str) -> Result<(), StorageError>;

    /// Move an unreadable document out of the way so the next write
    /// does not destroy it.
    fn quarantine(&self) -> Result<(), StorageError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}
