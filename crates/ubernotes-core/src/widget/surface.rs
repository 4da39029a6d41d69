//! Platform seam: how the registry creates and talks to widget surfaces.

use super::WidgetId;
use crate::bridge::HostMessage;
use crate::geometry::{Bounds, WorkArea};
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Failed to create widget surface: {0}")]
    Creation(String),
}

/// Everything a platform needs to open a widget surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub id: WidgetId,
    pub title: String,
    pub template: String,
    pub bounds: Bounds,
}

/// A live widget surface (window plus isolated widget context).
pub trait WidgetSurface {
    /// Current outer geometry.
    fn bounds(&self) -> Bounds;

    /// Deliver a message to the widget. Dropped silently if the widget is gone.
    fn send(&self, message: HostMessage);

    /// Ask the platform to close the surface. Confirmation arrives later as a
    /// destroyed event.
    fn close(&mut self);
}

/// Creates surfaces on the current platform.
pub trait SurfaceFactory {
    type Surface: WidgetSurface;

    /// Work area of the primary display.
    fn primary_work_area(&self) -> WorkArea;

    /// Create a surface synchronously.
    fn create_surface(&self, spec: &SurfaceSpec) -> Result<Self::Surface, SurfaceError>;
}
