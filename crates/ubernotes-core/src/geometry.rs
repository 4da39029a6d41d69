//! Integer display geometry for widget windows.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Top-left corner of a widget window, in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Outer size of a widget window. Both dimensions are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Create a size, clamping zero dimensions to one pixel.
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }
}

/// Position and size of a live widget surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub position: Position,
    pub size: Size,
}

impl Bounds {
    pub const fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }
}

/// Usable area of a display (excludes task bars and docks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkArea {
    pub origin: Position,
    pub size: Size,
}

impl WorkArea {
    pub const fn new(origin: Position, size: Size) -> Self {
        Self { origin, size }
    }

    /// Check whether a rectangle fits entirely inside the work area.
    pub fn contains(&self, bounds: &Bounds) -> bool {
        let left = i64::from(self.origin.x);
        let top = i64::from(self.origin.y);
        let right = left + i64::from(self.size.width);
        let bottom = top + i64::from(self.size.height);

        let x = i64::from(bounds.position.x);
        let y = i64::from(bounds.position.y);
        x >= left
            && y >= top
            && x + i64::from(bounds.size.width) <= right
            && y + i64::from(bounds.size.height) <= bottom
    }

    /// Pick a uniformly random position that keeps a window of `size` on screen.
    ///
    /// Windows larger than the work area are pinned to its origin on that axis.
    pub fn random_position<R: Rng + ?Sized>(&self, size: Size, rng: &mut R) -> Position {
        let slack_x = self.size.width.saturating_sub(size.width);
        let slack_y = self.size.height.saturating_sub(size.height);
        let dx = rng.random_range(0..=slack_x);
        let dy = rng.random_range(0..=slack_y);
        Position::new(
            self.origin.x.saturating_add_unsigned(dx),
            self.origin.y.saturating_add_unsigned(dy),
        )
    }
}
