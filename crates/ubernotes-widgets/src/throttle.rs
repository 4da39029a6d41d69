//! Rate limiting for periodic state pushes.
//!
//! Demo widgets refresh their data on a timer; their state blob is pushed to
//! the host at most once per interval, and only when something changed.

use std::time::{Duration, Instant};

/// Default interval between state pushes, in seconds.
pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 2;

/// Tracks whether unsaved changes exist and when the last push happened.
#[derive(Debug, Clone)]
pub struct SaveThrottle {
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl SaveThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_save: None,
            dirty: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark that the state has unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if a push is due at `now` (dirty + interval elapsed).
    pub fn should_save(&self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }

        match self.last_save {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Record a push at `now`.
    pub fn mark_saved(&mut self, now: Instant) {
        self.last_save = Some(now);
        self.dirty = false;
    }
}

impl Default for SaveThrottle {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SAVE_INTERVAL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_throttle_never_saves() {
        let throttle = SaveThrottle::default();
        assert!(!throttle.is_dirty());
        assert!(!throttle.should_save(Instant::now()));
    }

    #[test]
    fn test_first_dirty_saves_immediately() {
        let mut throttle = SaveThrottle::default();
        throttle.mark_dirty();
        assert!(throttle.should_save(Instant::now()));
    }

    #[test]
    fn test_interval_respected() {
        let start = Instant::now();
        let mut throttle = SaveThrottle::new(Duration::from_secs(2));
        throttle.mark_dirty();
        throttle.mark_saved(start);
        assert!(!throttle.is_dirty());

        throttle.mark_dirty();
        assert!(!throttle.should_save(start + Duration::from_secs(1)));
        assert!(throttle.should_save(start + Duration::from_secs(2)));
    }
}
