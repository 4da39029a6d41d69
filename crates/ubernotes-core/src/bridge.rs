//! Message bridge between the host and widget instances.
//!
//! Widgets run in isolated contexts; these two enums are the only things that
//! cross the boundary. Messages are JSON-tagged so the same types work over a
//! channel or a serialized transport.

use crate::widget::WidgetId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation id of one content round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveToken(pub u64);

impl fmt::Display for SaveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Messages sent from the host to a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// Sent once, after the widget reported `Ready`.
    Init {
        identity: WidgetId,
        content: String,
        template: String,
    },
    /// Ask the widget to report its current content.
    RequestContentForSave { token: SaveToken },
}

/// Messages sent from a widget to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetMessage {
    /// The widget surface is ready to receive `Init`.
    Ready,
    /// Reply to exactly one `RequestContentForSave`.
    ContentReport { token: SaveToken, content: String },
    /// User asked for a new widget.
    RequestCreate,
    /// User asked to close this widget.
    RequestClose,
    /// Content changed inside the widget.
    RequestSaveContent { content: String },
}
