//! System-wide accelerator registration.

use crate::shortcuts::{Shortcut, ShortcutAction};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("Unsupported accelerator key: {0}")]
    UnsupportedKey(String),
    #[error("Hotkey registration failed: {0}")]
    Registration(#[from] global_hotkey::Error),
}

/// Registered global accelerators. Unregistered on drop.
///
/// Must be created on the main thread.
pub struct GlobalShortcuts {
    manager: GlobalHotKeyManager,
    bindings: Vec<(HotKey, ShortcutAction)>,
}

impl GlobalShortcuts {
    pub fn register(shortcuts: &[Shortcut]) -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new()?;
        let mut bindings = Vec::with_capacity(shortcuts.len());

        for shortcut in shortcuts {
            let code = key_code(shortcut.key).ok_or_else(|| HotkeyError::UnsupportedKey(shortcut.key.to_string()))?;
            let hotkey = HotKey::new(Some(modifiers(shortcut)), code);
            manager.register(hotkey)?;
            log::info!("Registered global hotkey {} (id: {})", shortcut.format(), hotkey.id());
            bindings.push((hotkey, shortcut.action));
        }

        Ok(Self { manager, bindings })
    }

    /// Drain pending hotkey events into triggered actions.
    pub fn poll(&self) -> Vec<ShortcutAction> {
        let mut actions = Vec::new();
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            // Releases are ignored so one press fires once.
            if event.state != HotKeyState::Pressed {
                continue;
            }
            if let Some((_, action)) = self.bindings.iter().find(|(hotkey, _)| hotkey.id() == event.id) {
                actions.push(*action);
            }
        }
        actions
    }
}

impl Drop for GlobalShortcuts {
    fn drop(&mut self) {
        for (hotkey, _) in &self.bindings {
            if let Err(e) = self.manager.unregister(*hotkey) {
                log::debug!("Failed to unregister hotkey {}: {}", hotkey.id(), e);
            }
        }
    }
}

/// `Ctrl` maps to `Cmd` on macOS.
fn modifiers(shortcut: &Shortcut) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if shortcut.ctrl {
        modifiers |= if cfg!(target_os = "macos") {
            Modifiers::SUPER
        } else {
            Modifiers::CONTROL
        };
    }
    if shortcut.shift {
        modifiers |= Modifiers::SHIFT;
    }
    modifiers
}

fn key_code(key: &str) -> Option<Code> {
    let code = match key.to_ascii_uppercase().as_str() {
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "SPACE" => Code::Space,
        _ => return None,
    };
    Some(code)
}
