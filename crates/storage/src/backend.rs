//! File-backed history document.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::traits::HistoryBackend;

/// Stores the history document at a fixed path.
///
/// Writes go to a sibling temp file which is flushed, synced and renamed
/// over the target, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }
}

impl HistoryBackend for JsonFileBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    fn write(&self, document: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| StorageError::io(&temp_path, e))?;
            file.write_all(document.as_bytes()).map_err(|e| StorageError::io(&temp_path, e))?;
            file.sync_all().map_err(|e| StorageError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::io(&self.path, e)
        })
    }

    fn quarantine(&self) -> Result<(), StorageError> {
        let target = self.quarantine_path();
        fs::rename(&self.path, &target).map_err(|e| StorageError::io(&self.path, e))?;
        tracing::warn!(from = %self.path.display(), to = %target.display(), "moved unreadable history aside");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
