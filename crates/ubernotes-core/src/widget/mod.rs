//! Widget identity, persisted records and the host-side registry.
//!
//! A widget is a live surface (window) plus a persisted record. The record
//! outlives the surface: closing a widget keeps its last record so the widget
//! comes back on the next launch.

mod config;
mod manager;
mod state;
mod surface;

#[cfg(test)]
mod mock;

pub use config::{ResolvedConfig, WidgetOptions};
pub use manager::{RegistryConfig, RegistryError, RegistryResult, WidgetRegistry, DEFAULT_CLOSE_SAVE_TIMEOUT};
pub use state::Lifecycle;
pub use surface::{SurfaceError, SurfaceFactory, SurfaceSpec, WidgetSurface};

use crate::geometry::{Position, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-unique widget identity; also the suffix of the record's store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(pub u64);

impl WidgetId {
    /// Largest identity accepted from a store key. Identities stay exact as
    /// JSON numbers and the counter can always step past them.
    pub const MAX: u64 = (1 << 53) - 1;

    /// Parse the identity out of a `widgets.<id>` store key.
    pub fn from_store_key(key: &str) -> Option<Self> {
        let (namespace, id) = key.split_once('.')?;
        if namespace != crate::storage::WIDGETS_NAMESPACE {
            return None;
        }
        match id.parse::<u64>() {
            Ok(id) if (1..=Self::MAX).contains(&id) => Some(Self(id)),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted geometry and content of one widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRecord {
    #[serde(flatten)]
    pub position: Position,
    #[serde(flatten)]
    pub size: Size,
    pub content: String,
    pub template: String,
}
