//! winit-backed widget surfaces.
//!
//! Each surface is a frameless window plus a runtime thread running the
//! widget's view. Messages from the runtime reach the event loop as user
//! events through an [`EventLoopProxy`].

use crate::app::AppEvent;
use std::cell::Cell;
use ubernotes_core::{
    Bounds, HostMessage, Position, Settings, Size, SurfaceError, SurfaceFactory, SurfaceSpec, WidgetId, WidgetMessage,
    WidgetSurface, WorkArea,
};
use ubernotes_widgets::{HostLink, RuntimeEvent, WidgetInput, WidgetRuntime, view_for_template};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

/// Used when no monitor is reported.
const FALLBACK_WORK_AREA: WorkArea = WorkArea::new(Position::new(0, 0), Size::new(1280, 800));

/// Runtime-to-host link that wakes the event loop.
struct ProxyLink {
    id: WidgetId,
    proxy: EventLoopProxy<AppEvent>,
}

impl HostLink for ProxyLink {
    fn post(&self, message: WidgetMessage) -> bool {
        self.proxy.send_event(AppEvent::Widget { id: self.id, message }).is_ok()
    }
}

/// A widget window and its runtime channel.
pub struct WinitSurface {
    id: WidgetId,
    window: Option<Window>,
    events: async_channel::Sender<RuntimeEvent>,
    proxy: EventLoopProxy<AppEvent>,
    last_bounds: Cell<Bounds>,
}

impl WinitSurface {
    pub fn window_id(&self) -> Option<WindowId> {
        self.window.as_ref().map(Window::id)
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    /// Forward a user action to the widget.
    pub fn input(&self, input: WidgetInput) {
        self.deliver(RuntimeEvent::Input(input));
    }

    /// Wake the widget's periodic refresh.
    pub fn tick(&self) {
        self.deliver(RuntimeEvent::Tick);
    }

    fn deliver(&self, event: RuntimeEvent) {
        if let Err(e) = self.events.try_send(event) {
            log::trace!("Widget {} runtime unavailable: {}", self.id, e);
        }
    }
}

impl WidgetSurface for WinitSurface {
    fn bounds(&self) -> Bounds {
        if let Some(window) = &self.window {
            let position = window
                .outer_position()
                .map(|p| Position::new(p.x, p.y))
                .unwrap_or(self.last_bounds.get().position);
            let size = window.inner_size();
            self.last_bounds.set(Bounds::new(position, Size::new(size.width, size.height)));
        }
        self.last_bounds.get()
    }

    fn send(&self, message: HostMessage) {
        self.deliver(RuntimeEvent::Host(message));
    }

    /// Drops the window, ends the runtime and posts [`AppEvent::Destroyed`].
    ///
    /// Dropping a winit window destroys it synchronously, so the posted event
    /// is the platform confirmation. `WindowEvent::Destroyed` is not waited
    /// for because not every backend delivers it for dropped windows.
    fn close(&mut self) {
        let Some(window) = self.window.take() else {
            return;
        };
        // Final geometry stays readable after the window is gone.
        self.bounds();
        drop(window);
        self.events.close();
        if self.proxy.send_event(AppEvent::Destroyed { id: self.id }).is_err() {
            log::debug!("Event loop gone before widget {} was destroyed", self.id);
        }
    }
}

/// Creates widget windows inside an active event loop.
pub struct WinitFactory<'a> {
    event_loop: &'a ActiveEventLoop,
    proxy: &'a EventLoopProxy<AppEvent>,
    settings: Settings,
}

impl<'a> WinitFactory<'a> {
    pub fn new(event_loop: &'a ActiveEventLoop, proxy: &'a EventLoopProxy<AppEvent>, settings: Settings) -> Self {
        Self {
            event_loop,
            proxy,
            settings,
        }
    }
}

impl SurfaceFactory for WinitFactory<'_> {
    type Surface = WinitSurface;

    fn primary_work_area(&self) -> WorkArea {
        let monitor = self
            .event_loop
            .primary_monitor()
            .or_else(|| self.event_loop.available_monitors().next());
        match monitor {
            Some(monitor) => {
                let position = monitor.position();
                let size = monitor.size();
                WorkArea::new(Position::new(position.x, position.y), Size::new(size.width, size.height))
            }
            None => {
                log::warn!("No monitor reported, using a default work area");
                FALLBACK_WORK_AREA
            }
        }
    }

    fn create_surface(&self, spec: &SurfaceSpec) -> Result<WinitSurface, SurfaceError> {
        let attributes = Window::default_attributes()
            .with_title(&spec.title)
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(true)
            .with_position(PhysicalPosition::new(spec.bounds.position.x, spec.bounds.position.y))
            .with_inner_size(PhysicalSize::new(spec.bounds.size.width, spec.bounds.size.height));

        let window = self
            .event_loop
            .create_window(attributes)
            .map_err(|e| SurfaceError::Creation(e.to_string()))?;

        let (events, inbox) = async_channel::unbounded();
        let link = ProxyLink {
            id: spec.id,
            proxy: self.proxy.clone(),
        };
        WidgetRuntime::new(view_for_template(&spec.template, &self.settings), link)
            .spawn(inbox, format!("widget-{}", spec.id))
            .map_err(|e| SurfaceError::Creation(format!("Failed to start widget runtime: {}", e)))?;

        log::debug!("Created {} window for widget {}", spec.template, spec.id);
        Ok(WinitSurface {
            id: spec.id,
            window: Some(window),
            events,
            proxy: self.proxy.clone(),
            last_bounds: Cell::new(spec.bounds),
        })
    }
}
