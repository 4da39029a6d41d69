//! The interface every widget kind implements inside its isolated context.

use std::time::Instant;

/// User actions delivered to a widget by its surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetInput {
    /// Typed text appended to the content.
    Text(String),
    /// Whole-content replacement from the editor.
    ReplaceContent(String),
    /// Speech recognition transcript.
    Dictation(String),
    /// AI mutator instruction.
    Instruction(String),
    /// Undo the last mutation.
    Revert,
    /// Pick a chart range (`7d`, `30d`).
    SelectRange(String),
    /// Close button.
    Close,
    /// New-widget button.
    NewWidget,
}

/// Effect of an input or tick on the widget's persisted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Content changed and should be saved.
    Changed,
    /// Input handled, nothing to save.
    Unchanged,
    /// This widget kind does not handle the input.
    Ignored,
}

/// Behaviour of one widget kind.
pub trait WidgetView: Send {
    /// Apply the initial content sent by the host.
    fn init(&mut self, content: &str);

    /// Current content payload, as persisted by the host.
    fn content(&self) -> String;

    /// React to a user action.
    fn handle_input(&mut self, input: WidgetInput) -> InputOutcome;

    /// Periodic refresh. Returns `Changed` when persisted state moved.
    fn tick(&mut self, _now: Instant) -> InputOutcome {
        InputOutcome::Unchanged
    }

    /// Whether content changes are pushed immediately or rate-limited.
    fn saves_immediately(&self) -> bool {
        true
    }
}
