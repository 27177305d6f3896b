pub mod local;
pub mod memory;

use crate::types::{Document, InvariantViolation};

/// Durable slot holding one serialized board document.
/// Implementations: FileStore (filesystem), MemoryStore (in-process).
pub trait DocumentStore: Send + Sync {
    /// Read the stored document. `Ok(None)` means the slot is empty.
    fn load(&self) -> Result<Option<Document>, StorageError>;

    /// Replace the stored document with `doc`.
    fn save(&self, doc: &Document) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored document is inconsistent: {0}")]
    Corrupt(#[from] InvariantViolation),
}

/// Parse and validate a stored document.
pub fn decode(raw: &str) -> Result<Document, StorageError> {
    let doc: Document = serde_json::from_str(raw)?;
    doc.check_invariants()?;
    Ok(doc)
}

pub fn encode(doc: &Document) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Load the stored document, falling back to the seed board when the slot is
/// empty, unreadable or inconsistent.
pub fn load_or_seed(store: &dyn DocumentStore) -> Document {
    match store.load() {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            log::info!(target: "taskboard.storage", "No stored board, starting from the seed board");
            Document::seed()
        }
        Err(e) => {
            log::warn!(
                target: "taskboard.storage",
                "Failed to load stored board, starting from the seed board: {}",
                e
            );
            Document::seed()
        }
    }
}
