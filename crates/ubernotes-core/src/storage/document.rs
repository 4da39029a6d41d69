//! Nested JSON document addressed by dotted keys.

use super::{StorageError, StorageResult};
use serde_json::{Map, Value};

/// A JSON object tree where `widgets.3` addresses `root["widgets"]["3"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Document {
    root: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed value. Non-objects are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = split_key(key).ok()?.into_iter();
        let first = segments.next()?;
        let mut node = self.root.get(first)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    pub fn set(&mut self, key: &str, value: Value) -> StorageResult<()> {
        let segments = split_key(key)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| StorageError::Other(format!("Invalid key: {:?}", key)))?;

        let mut node = &mut self.root;
        for segment in parents {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just replaced with an object"),
            };
        }
        node.insert(last.to_string(), value);
        Ok(())
    }

    /// Direct children of the object at `prefix`, with their full keys.
    pub fn enumerate(&self, prefix: &str) -> Vec<(String, Value)> {
        let prefix = prefix.trim_end_matches('.');
        if prefix.is_empty() {
            return self
                .root
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
        }

        match self.get(prefix).and_then(Value::as_object) {
            Some(children) => children
                .iter()
                .map(|(key, value)| (format!("{}.{}", prefix, key), value.clone()))
                .collect(),
            None => Vec::new(),
        }
    }
}

fn split_key(key: &str) -> StorageResult<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StorageError::Other(format!("Invalid key: {:?}", key)));
    }
    Ok(segments)
}
