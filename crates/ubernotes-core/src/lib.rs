//! UberNotes Core Library
//!
//! Platform-agnostic widget lifecycle and persistence for the UberNotes
//! sticky widgets host.

pub mod bridge;
pub mod geometry;
pub mod storage;
pub mod template;
pub mod widget;

pub use bridge::{HostMessage, SaveToken, WidgetMessage};
pub use geometry::{Bounds, Position, Size, WorkArea};
pub use storage::{FileStore, MemoryStore, Setting, Settings, StorageError, StorageResult, Store};
pub use template::{TemplateRegistry, TemplateSpec};
pub use widget::{
    Lifecycle, RegistryConfig, RegistryError, RegistryResult, SurfaceError, SurfaceFactory, SurfaceSpec,
    WidgetId, WidgetOptions, WidgetRecord, WidgetRegistry, WidgetSurface,
};
