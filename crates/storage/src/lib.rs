//! Storage layer for delivery-guard
//!
//! Keeps the analysis history as one JSON document holding both the ordered
//! summaries and the full reports, replaced atomically on every write.

mod backend;
mod error;
mod history;
mod memory;
#[cfg(test)]
mod tests;
pub mod traits;
mod types;

pub use backend::JsonFileBackend;
pub use error::StorageError;
pub use history::HistoryStore;
pub use memory::MemoryBackend;
pub use traits::HistoryBackend;
pub use types::HistorySnapshot;
