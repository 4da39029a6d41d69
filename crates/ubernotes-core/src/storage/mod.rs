//! Storage abstraction for persistence.
//!
//! The registry consumes exactly three operations: `get`, `set` and
//! `enumerate`. Keys are dotted paths (`widgets.3`, `settings.autostart`)
//! into one nested JSON document.

mod document;
mod file;
mod memory;
mod settings;

pub use file::{FileStore, STORE_FILE_NAME};
pub use memory::MemoryStore;
pub use settings::{Setting, Settings};

use serde_json::Value;
use thiserror::Error;

/// Namespace holding one record per widget identity.
pub const WIDGETS_NAMESPACE: &str = "widgets";
/// Namespace holding global feature flags.
pub const SETTINGS_NAMESPACE: &str = "settings";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable key-value store backing widget records and settings.
///
/// Implementations guard their own state; callers need no external locking.
pub trait Store: Send + Sync {
    /// Read a value. Absent keys and unreadable state both yield `None`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Insert or replace a value. Durable once this returns `Ok`.
    fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// All entries directly under a namespace prefix, in no particular order.
    fn enumerate(&self, prefix: &str) -> Vec<(String, Value)>;

    /// Read a value, or `default` when absent.
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

/// Store key of a widget record.
pub fn widget_key(id: impl std::fmt::Display) -> String {
    format!("{}.{}", WIDGETS_NAMESPACE, id)
}

/// Store key of a named setting.
pub fn setting_key(name: &str) -> String {
    format!("{}.{}", SETTINGS_NAMESPACE, name)
}
