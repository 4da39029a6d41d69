//! UberNotes application shell.
//!
//! Windowing, global accelerators and the event loop that drives the widget
//! registry.

mod app;
mod hotkeys;
mod shortcuts;
mod surface;

pub use app::{App, AppConfig, AppError, AppEvent, DATA_DIR_ENV};
pub use hotkeys::{GlobalShortcuts, HotkeyError};
pub use shortcuts::{NEW_WIDGET, Shortcut, ShortcutAction, ShortcutRegistry};
pub use surface::{WinitFactory, WinitSurface};
