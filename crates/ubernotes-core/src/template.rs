//! Widget templates: the kinds of widget the host knows how to instantiate.

use crate::geometry::Size;
use std::collections::HashMap;

/// Template key of the note editor.
pub const NOTE_TEMPLATE: &str = "note";
/// Template key of the simulated weather panel.
pub const WEATHER_TEMPLATE: &str = "weather";
/// Template key of the simulated Ethereum price chart.
pub const ETH_PRICE_TEMPLATE: &str = "eth-price-chart";

/// Static description of a widget kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    /// Identifier stored in widget records.
    pub key: String,
    /// Window title.
    pub title: String,
    /// Size used when neither the caller nor a saved record provides one.
    pub default_size: Size,
}

impl TemplateSpec {
    pub fn new(key: impl Into<String>, title: impl Into<String>, default_size: Size) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            default_size,
        }
    }
}

/// Registered templates plus the designated fallback.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateSpec>,
    fallback: String,
}

impl TemplateRegistry {
    /// Create an empty registry whose fallback is `fallback`.
    ///
    /// The fallback must be registered before the registry is used to resolve.
    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            templates: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Registry with the built-in note and demo templates, falling back to `note`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty(NOTE_TEMPLATE);
        registry.register(TemplateSpec::new(NOTE_TEMPLATE, "Note", Size::new(300, 200)));
        registry.register(TemplateSpec::new(WEATHER_TEMPLATE, "Weather", Size::new(320, 220)));
        registry.register(TemplateSpec::new(ETH_PRICE_TEMPLATE, "ETH Price", Size::new(360, 260)));
        registry
    }

    /// Register (or replace) a template.
    pub fn register(&mut self, spec: TemplateSpec) {
        self.templates.insert(spec.key.clone(), spec);
    }

    /// Change the fallback template. Ignored if `key` is not registered.
    pub fn set_fallback(&mut self, key: &str) -> bool {
        if self.templates.contains_key(key) {
            self.fallback = key.to_string();
            true
        } else {
            false
        }
    }

    pub fn get(&self, key: &str) -> Option<&TemplateSpec> {
        self.templates.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub fn fallback_key(&self) -> &str {
        &self.fallback
    }

    /// The fallback template's spec.
    pub fn fallback(&self) -> TemplateSpec {
        self.templates
            .get(&self.fallback)
            .cloned()
            .unwrap_or_else(|| TemplateSpec::new(self.fallback.clone(), "Widget", Size::new(300, 200)))
    }

    /// Resolve a requested key, falling back for unknown or missing keys.
    pub fn resolve(&self, key: Option<&str>) -> TemplateSpec {
        match key {
            Some(key) => match self.templates.get(key) {
                Some(spec) => spec.clone(),
                None => {
                    log::warn!("Unknown widget template {:?}, using {:?}", key, self.fallback);
                    self.fallback()
                }
            },
            None => self.fallback(),
        }
    }

    /// All registered template keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
