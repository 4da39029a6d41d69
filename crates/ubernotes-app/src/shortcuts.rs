//! Keyboard shortcut registry.

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    NewWidget,
    CloseWidget,
    Quit,
    Revert,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+N").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether a key press matches. Letter keys compare case-insensitively.
    pub fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.ctrl == ctrl && self.shift == shift && self.key.eq_ignore_ascii_case(key)
    }
}

/// System-wide accelerator that creates a widget.
pub const NEW_WIDGET: Shortcut = Shortcut::new("N", true, true, ShortcutAction::NewWidget, "New widget (global)");

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            NEW_WIDGET,
            Shortcut::new("W", true, false, ShortcutAction::CloseWidget, "Close widget"),
            Shortcut::new("Q", true, false, ShortcutAction::Quit, "Quit UberNotes"),
            Shortcut::new("Z", true, false, ShortcutAction::Revert, "Revert last AI edit"),
        ]
    }

    /// Find the window-local action for a key press.
    pub fn action_for(key: &str, ctrl: bool, shift: bool) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(key, ctrl, shift))
            .map(|shortcut| shortcut.action)
    }

    /// Log all shortcuts at debug level.
    pub fn log_all() {
        for shortcut in Self::all() {
            log::debug!("  {:16} {}", shortcut.format(), shortcut.description);
        }
    }
}
