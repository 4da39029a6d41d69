//! In-memory storage implementation.

use super::document::Document;
use super::{StorageError, StorageResult, Store};
use serde_json::Value;
use std::sync::RwLock;

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    document: RwLock<Document>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the whole document, for inspection.
    pub fn snapshot(&self) -> Value {
        self.document
            .read()
            .map(|doc| doc.to_value())
            .unwrap_or(Value::Null)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let doc = self.document.read().ok()?;
        doc.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut doc = self
            .document
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        doc.set(key, value)
    }

    fn enumerate(&self, prefix: &str) -> Vec<(String, Value)> {
        match self.document.read() {
            Ok(doc) => doc.enumerate(prefix),
            Err(_) => Vec::new(),
        }
    }
}
