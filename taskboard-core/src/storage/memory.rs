/// In-process storage slot holding the serialized document.
///
/// Goes through the same JSON encoding as `FileStore`, so a round trip
/// exercises serialization exactly like the durable store does.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{decode, encode, DocumentStore, StorageError};
use crate::types::Document;

#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw content, which need not be valid.
    pub fn with_raw(raw: &str) -> Self {
        Self {
            slot: Mutex::new(Some(raw.to_string())),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().unwrap().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<Document>, StorageError> {
        self.slot.lock().unwrap().as_deref().map(decode).transpose()
    }

    fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let raw = encode(doc)?;
        *self.slot.lock().unwrap() = Some(raw);
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
