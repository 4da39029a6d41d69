//! Global feature flags persisted under `settings.<name>`.

use super::{StorageResult, Store, setting_key};
use serde_json::Value;

/// Known boolean settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    VoiceDictationEnabled,
    AiMutatorEnabled,
    Autostart,
}

impl Setting {
    pub const ALL: [Setting; 3] = [
        Setting::VoiceDictationEnabled,
        Setting::AiMutatorEnabled,
        Setting::Autostart,
    ];

    /// Name under the settings namespace.
    pub fn name(self) -> &'static str {
        match self {
            Setting::VoiceDictationEnabled => "voiceDictationEnabled",
            Setting::AiMutatorEnabled => "aiMutatorEnabled",
            Setting::Autostart => "autostart",
        }
    }

    pub fn default_value(self) -> bool {
        true
    }

    /// Read the flag, falling back to its default on absent or mistyped values.
    pub fn read(self, store: &dyn Store) -> bool {
        match store.get(&setting_key(self.name())) {
            Some(Value::Bool(value)) => value,
            Some(other) => {
                log::warn!("Setting {} has non-boolean value {}, using default", self.name(), other);
                self.default_value()
            }
            None => self.default_value(),
        }
    }

    pub fn write(self, store: &dyn Store, value: bool) -> StorageResult<()> {
        store.set(&setting_key(self.name()), Value::Bool(value))
    }
}

/// Snapshot of all settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub voice_dictation_enabled: bool,
    pub ai_mutator_enabled: bool,
    pub autostart: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_dictation_enabled: Setting::VoiceDictationEnabled.default_value(),
            ai_mutator_enabled: Setting::AiMutatorEnabled.default_value(),
            autostart: Setting::Autostart.default_value(),
        }
    }
}

impl Settings {
    pub fn load(store: &dyn Store) -> Self {
        Self {
            voice_dictation_enabled: Setting::VoiceDictationEnabled.read(store),
            ai_mutator_enabled: Setting::AiMutatorEnabled.read(store),
            autostart: Setting::Autostart.read(store),
        }
    }
}
