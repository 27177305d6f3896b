/// Local filesystem document store.
///
/// One JSON file per storage slot, `<dir>/<slot>.json`, with:
/// - Atomic writes (write to .tmp, fsync, rename, fsync directory)
/// - SHA-256 hash of the last read/written content to skip redundant writes
/// - Invariant validation on load
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use super::{decode, encode, DocumentStore, StorageError};
use crate::types::Document;

/// Storage slot name used when none is configured.
pub const DEFAULT_SLOT: &str = "todo-board-state";

pub struct FileStore {
    path: PathBuf,
    /// SHA-256 of the content last read from or written to `path`
    last_hash: Mutex<Option<String>>,
}

impl FileStore {
    pub fn new(dir: &Path, slot: &str) -> Self {
        Self::at_path(dir.join(format!("{}.json", slot)))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            last_hash: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compute SHA-256 hash of content (for change detection).
    fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.replace("\r\n", "\n").as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> Result<Option<Document>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let doc = decode(&content)?;
        *self.last_hash.lock().unwrap() = Some(Self::content_hash(&content));
        log::debug!(target: "taskboard.storage", "Loaded board from {}", self.path.display());
        Ok(Some(doc))
    }

    fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let content = encode(doc)?;
        let hash = Self::content_hash(&content);

        let mut last_hash = self.last_hash.lock().unwrap();
        if last_hash.as_deref() == Some(hash.as_str()) && self.path.exists() {
            log::debug!(target: "taskboard.storage", "Board unchanged, skipping write");
            return Ok(());
        }

        Self::atomic_write(&self.path, &content)?;
        *last_hash = Some(hash);
        log::debug!(target: "taskboard.storage", "Saved board to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_slot() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), DEFAULT_SLOT);
        assert!(store.load().unwrap().is_none());
        assert!(store.path().ends_with("todo-board-state.json"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(&dir.path().join("nested"), "board");

        let mut doc = Document::seed();
        doc.tasks.get_mut("task-1").unwrap().completed = true;
        store.save(&doc).unwrap();

        let reopened = FileStore::new(&dir.path().join("nested"), "board");
        assert_eq!(reopened.load().unwrap(), Some(doc));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_written_json_shape() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), DEFAULT_SLOT);
        store.save(&Document::seed()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["columnOrder"][0], "column-1");
        assert_eq!(json["tasks"]["task-5"]["text"], "Implement OAuth2 flow");
    }

    #[test]
    fn test_unchanged_document_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), DEFAULT_SLOT);
        store.save(&Document::seed()).unwrap();

        // Tamper behind the store's back; an identical save must not touch the file.
        fs::write(store.path(), "external").unwrap();
        store.save(&Document::seed()).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "external");

        let mut changed = Document::seed();
        changed.column_order.reverse();
        store.save(&changed).unwrap();
        assert_eq!(store.load().unwrap(), Some(changed));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), DEFAULT_SLOT);
        fs::write(store.path(), "{\"tasks\": 3}").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Json(_))));
    }
}
