//! File-backed store.
//!
//! The whole document lives in one pretty-printed JSON file. Every `set`
//! rewrites it through a temporary file and an atomic rename.

use super::document::Document;
use super::{StorageError, StorageResult, Store};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// File name of the store document inside its directory.
pub const STORE_FILE_NAME: &str = "ubernotes-config.json";

/// JSON file store for native platforms.
pub struct FileStore {
    path: PathBuf,
    document: RwLock<Document>,
}

impl FileStore {
    /// Open the store in `base_path`, creating the directory if needed.
    ///
    /// A corrupt document is moved aside and replaced by an empty one.
    pub fn open(base_path: impl AsRef<Path>) -> StorageResult<Self> {
        let base_path = base_path.as_ref();
        if !base_path.exists() {
            fs::create_dir_all(base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let path = base_path.join(STORE_FILE_NAME);
        let document = load_document(&path);
        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Open the store in the default location.
    ///
    /// On Linux: `~/.local/share/ubernotes/`
    /// On Windows: `%LOCALAPPDATA%\ubernotes\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::open(base.join("ubernotes"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, document: &Document) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(&document.to_value())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StorageError::Io(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

fn load_document(path: &Path) -> Document {
    if !path.exists() {
        return Document::new();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str::<Value>(&json).map_err(|e| e.to_string()))
        .and_then(|value| Document::from_value(value).ok_or_else(|| "not an object".to_string()));

    match parsed {
        Ok(document) => document,
        Err(reason) => {
            let backup = path.with_extension("json.corrupt");
            log::warn!(
                "Store {} is unreadable ({}), starting empty; moved to {}",
                path.display(),
                reason,
                backup.display()
            );
            if let Err(e) = fs::rename(path, &backup) {
                log::warn!("Failed to move corrupt store aside: {}", e);
            }
            Document::new()
        }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let doc = self.document.read().ok()?;
        doc.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut doc = self
            .document
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        doc.set(key, value)?;
        self.flush(&doc)
    }

    fn enumerate(&self, prefix: &str) -> Vec<(String, Value)> {
        match self.document.read() {
            Ok(doc) => doc.enumerate(prefix),
            Err(_) => Vec::new(),
        }
    }
}
