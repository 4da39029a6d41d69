//! Typed widget configuration and its three-layer merge.
//!
//! Precedence, applied field by field:
//! explicit call options > persisted record for the identity > template defaults.

use super::WidgetRecord;
use crate::geometry::{Position, Size, WorkArea};
use crate::template::{TemplateRegistry, TemplateSpec};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optional configuration for one widget. Also the read shape of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub content: Option<String>,
    pub template: Option<String>,
}

impl WidgetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Parse a stored record. `None` for non-objects and wrongly typed fields.
    pub fn from_stored(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Fill every field missing here from `lower`.
    pub fn or(self, lower: &WidgetOptions) -> WidgetOptions {
        WidgetOptions {
            x: self.x.or(lower.x),
            y: self.y.or(lower.y),
            width: positive(self.width).or(positive(lower.width)),
            height: positive(self.height).or(positive(lower.height)),
            content: self.content.or_else(|| lower.content.clone()),
            template: self.template.or_else(|| lower.template.clone()),
        }
    }
}

impl From<&WidgetRecord> for WidgetOptions {
    fn from(record: &WidgetRecord) -> Self {
        Self {
            x: Some(record.position.x),
            y: Some(record.position.y),
            width: Some(record.size.width),
            height: Some(record.size.height),
            content: Some(record.content.clone()),
            template: Some(record.template.clone()),
        }
    }
}

fn positive(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

/// Fully resolved configuration used to instantiate a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub position: Position,
    pub size: Size,
    pub content: String,
    pub template: TemplateSpec,
}

impl ResolvedConfig {
    /// Merge explicit options over the persisted record over template defaults.
    pub fn resolve<R: Rng + ?Sized>(
        explicit: &WidgetOptions,
        persisted: Option<&WidgetOptions>,
        templates: &TemplateRegistry,
        work_area: WorkArea,
        rng: &mut R,
    ) -> Self {
        let merged = match persisted {
            Some(persisted) => explicit.clone().or(persisted),
            None => explicit.clone().or(&WidgetOptions::default()),
        };

        let template = templates.resolve(merged.template.as_deref());
        let size = Size::new(
            merged.width.unwrap_or(template.default_size.width),
            merged.height.unwrap_or(template.default_size.height),
        );

        let position = match (merged.x, merged.y) {
            (Some(x), Some(y)) => Position::new(x, y),
            (x, y) => {
                let random = work_area.random_position(size, rng);
                Position::new(x.unwrap_or(random.x), y.unwrap_or(random.y))
            }
        };

        Self {
            position,
            size,
            content: merged.content.unwrap_or_default(),
            template,
        }
    }
}
