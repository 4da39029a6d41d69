//! Widget instance lifecycle.

/// Lifecycle of one widget instance.
///
/// `Created -> Live -> Closing -> Destroyed`. A move or resize while `Live`
/// persists the widget without changing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Surface exists but has not been registered yet.
    #[default]
    Created,
    /// Registered and accepting geometry and content events.
    Live,
    /// Close requested; waiting for the final save and platform confirmation.
    Closing,
    /// Platform confirmed the surface is gone.
    Destroyed,
}

impl Lifecycle {
    /// Check if geometry changes should be persisted.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, Self::Closing)
    }

    /// Check if `next` is a legal successor of this state.
    pub fn can_advance_to(&self, next: Lifecycle) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Live)
                | (Self::Live, Self::Closing)
                | (Self::Closing, Self::Destroyed)
                | (Self::Live, Self::Destroyed)
        )
    }

    /// Move to `next`, returning false (and staying put) on an illegal transition.
    pub fn advance(&mut self, next: Lifecycle) -> bool {
        if self.can_advance_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }
}
