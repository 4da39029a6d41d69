//! Rich-text note widget.

use crate::mutator;
use crate::view::{InputOutcome, WidgetInput, WidgetView};
use chrono::Local;
use thiserror::Error;
use ubernotes_core::Settings;

/// Note widget errors, surfaced in the widget's status line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("Voice dictation is disabled")]
    DictationDisabled,
    #[error("AI mutator is disabled")]
    MutatorDisabled,
    #[error("Instruction is empty")]
    EmptyInstruction,
}

/// Note editor state: HTML content plus a snapshot for revert.
#[derive(Debug, Clone)]
pub struct NoteWidget {
    content: String,
    last_content: String,
    dictation_enabled: bool,
    mutator_enabled: bool,
    status: String,
}

impl NoteWidget {
    pub fn new(settings: &Settings) -> Self {
        Self {
            content: String::new(),
            last_content: String::new(),
            dictation_enabled: settings.voice_dictation_enabled,
            mutator_enabled: settings.ai_mutator_enabled,
            status: String::new(),
        }
    }

    /// Current note HTML.
    pub fn html(&self) -> &str {
        &self.content
    }

    /// Last status message shown to the user.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Replace the content (user edit).
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Insert a dictation transcript at the end of the note.
    pub fn insert_dictation(&mut self, transcript: &str) -> Result<(), NoteError> {
        if !self.dictation_enabled {
            return Err(NoteError::DictationDisabled);
        }
        self.content.push_str(transcript);
        self.content.push(' ');
        self.status = "Voice input added".to_string();
        Ok(())
    }

    /// Apply an AI mutator instruction, remembering the previous content.
    pub fn apply_instruction(&mut self, instruction: &str) -> Result<(), NoteError> {
        if !self.mutator_enabled {
            return Err(NoteError::MutatorDisabled);
        }
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(NoteError::EmptyInstruction);
        }

        self.last_content = self.content.clone();
        self.content = mutator::apply(instruction, &self.last_content, Local::now());
        self.status = "AI template applied".to_string();
        Ok(())
    }

    /// Restore the content from before the last mutation (or init).
    pub fn revert(&mut self) {
        self.content = self.last_content.clone();
        self.status = "Reverted to previous content".to_string();
    }
}

impl WidgetView for NoteWidget {
    fn init(&mut self, content: &str) {
        if !content.is_empty() {
            self.content = content.to_string();
            self.last_content = content.to_string();
        }
    }

    fn content(&self) -> String {
        self.content.clone()
    }

    fn handle_input(&mut self, input: WidgetInput) -> InputOutcome {
        let result = match input {
            WidgetInput::Text(text) => {
                self.content.push_str(&text);
                Ok(())
            }
            WidgetInput::ReplaceContent(content) => {
                self.set_content(content);
                Ok(())
            }
            WidgetInput::Dictation(transcript) => self.insert_dictation(&transcript),
            WidgetInput::Instruction(instruction) => self.apply_instruction(&instruction),
            WidgetInput::Revert => {
                self.revert();
                Ok(())
            }
            _ => return InputOutcome::Ignored,
        };

        match result {
            Ok(()) => InputOutcome::Changed,
            Err(e) => {
                log::debug!("Note input rejected: {}", e);
                self.status = e.to_string();
                InputOutcome::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> NoteWidget {
        NoteWidget::new(&Settings::default())
    }

    #[test]
    fn test_init_applies_non_empty_content() {
        let mut widget = note();
        widget.init("");
        assert_eq!(widget.html(), "");

        widget.init("<p>saved</p>");
        assert_eq!(widget.html(), "<p>saved</p>");
    }

    #[test]
    fn test_dictation_appends_with_space() {
        let mut widget = note();
        widget.set_content("Buy ");
        widget.insert_dictation("milk").unwrap();
        assert_eq!(widget.html(), "Buy milk ");
        assert_eq!(widget.status(), "Voice input added");
    }

    #[test]
    fn test_mutate_then_revert() {
        let mut widget = note();
        widget.set_content("Shopping");
        widget.apply_instruction("make this a header").unwrap();
        assert_eq!(widget.html(), "<h1>Shopping</h1>");

        widget.revert();
        assert_eq!(widget.html(), "Shopping");
    }

    #[test]
    fn test_disabled_features_reject_input() {
        let settings = Settings {
            voice_dictation_enabled: false,
            ai_mutator_enabled: false,
            autostart: true,
        };
        let mut widget = NoteWidget::new(&settings);

        assert_eq!(widget.insert_dictation("hi"), Err(NoteError::DictationDisabled));
        assert_eq!(
            widget.handle_input(WidgetInput::Instruction("todo".to_string())),
            InputOutcome::Unchanged
        );
        assert_eq!(widget.status(), "AI mutator is disabled");
        assert_eq!(widget.html(), "");
    }

    #[test]
    fn test_blank_instruction_rejected() {
        let mut widget = note();
        assert_eq!(widget.apply_instruction("   "), Err(NoteError::EmptyInstruction));
    }

    #[test]
    fn test_unrelated_input_ignored() {
        let mut widget = note();
        assert_eq!(
            widget.handle_input(WidgetInput::SelectRange("30d".to_string())),
            InputOutcome::Ignored
        );
    }
}
