//! Core application state and lifecycle.

use crate::hotkeys::GlobalShortcuts;
use crate::shortcuts::{NEW_WIDGET, Shortcut, ShortcutAction, ShortcutRegistry};
use crate::surface::{WinitFactory, WinitSurface};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use ubernotes_core::template::NOTE_TEMPLATE;
use ubernotes_core::widget::DEFAULT_CLOSE_SAVE_TIMEOUT;
use ubernotes_core::{
    FileStore, RegistryConfig, Settings, StorageError, TemplateRegistry, WidgetId, WidgetMessage, WidgetOptions,
    WidgetRegistry,
};
use ubernotes_widgets::WidgetInput;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{Key, ModifiersState};
use winit::window::WindowId;

/// Environment variable overriding the store directory.
pub const DATA_DIR_ENV: &str = "UBERNOTES_DATA_DIR";

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Events posted to the event loop from widget runtimes and surfaces.
#[derive(Debug)]
pub enum AppEvent {
    /// A message from widget `id`.
    Widget { id: WidgetId, message: WidgetMessage },
    /// The surface of widget `id` is gone.
    Destroyed { id: WidgetId },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store directory. `None` uses the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Template for default and fallback widgets.
    pub fallback_template: String,
    /// System-wide accelerator that creates a widget.
    pub new_widget_accelerator: Shortcut,
    /// Period of widget refresh ticks and hotkey polling.
    pub tick_interval: Duration,
    pub close_save_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            fallback_template: NOTE_TEMPLATE.to_string(),
            new_widget_accelerator: NEW_WIDGET,
            tick_interval: Duration::from_millis(500),
            close_save_timeout: DEFAULT_CLOSE_SAVE_TIMEOUT,
        }
    }
}

impl AppConfig {
    fn registry_config(&self) -> RegistryConfig {
        let mut templates = TemplateRegistry::builtin();
        if !templates.set_fallback(&self.fallback_template) {
            log::warn!(
                "Unknown fallback template {:?}, keeping {}",
                self.fallback_template,
                templates.fallback_key()
            );
        }
        RegistryConfig {
            templates,
            close_save_timeout: self.close_save_timeout,
        }
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    proxy: EventLoopProxy<AppEvent>,
    settings: Settings,
    registry: WidgetRegistry<FileStore, WinitSurface>,
    hotkeys: Option<GlobalShortcuts>,
    modifiers: ModifiersState,
    restored: bool,
    next_tick: Instant,
}

impl App {
    /// Create the application over an opened store.
    pub fn new(config: AppConfig, store: Arc<FileStore>, proxy: EventLoopProxy<AppEvent>) -> Self {
        let settings = Settings::load(store.as_ref());
        let registry = WidgetRegistry::new(store, config.registry_config());
        Self {
            config,
            proxy,
            settings,
            registry,
            hotkeys: None,
            modifiers: ModifiersState::empty(),
            restored: false,
            next_tick: Instant::now(),
        }
    }

    /// Run the application until the last widget closes or the user quits.
    pub fn run(config: AppConfig) -> Result<(), AppError> {
        let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;

        let store = match &config.data_dir {
            Some(dir) => FileStore::open(dir)?,
            None => FileStore::default_location()?,
        };
        log::info!("Using store at {}", store.path().display());

        let mut app = App::new(config, Arc::new(store), event_loop.create_proxy());
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    fn widget_for_window(&self, window_id: WindowId) -> Option<WidgetId> {
        self.registry
            .ids()
            .into_iter()
            .find(|id| self.registry.surface(*id).and_then(WinitSurface::window_id) == Some(window_id))
    }

    fn create_default_widget(&mut self, event_loop: &ActiveEventLoop) {
        let factory = WinitFactory::new(event_loop, &self.proxy, self.settings);
        match self.registry.create_widget(&factory, WidgetOptions::new()) {
            Ok(id) => log::info!("Created widget {}", id),
            Err(e) => log::error!("Failed to create widget: {}", e),
        }
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop) {
        if !self.registry.is_shutting_down() {
            self.registry.begin_shutdown();
            self.registry.close_all();
        }
        event_loop.exit();
    }

    fn run_action(&mut self, event_loop: &ActiveEventLoop, id: WidgetId, action: ShortcutAction) {
        match action {
            ShortcutAction::NewWidget => self.create_default_widget(event_loop),
            ShortcutAction::CloseWidget => self.registry.on_close_requested(id),
            ShortcutAction::Quit => self.quit(event_loop),
            ShortcutAction::Revert => {
                if let Some(surface) = self.registry.surface(id) {
                    surface.input(WidgetInput::Revert);
                }
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, id: WidgetId, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }

        let ctrl = self.modifiers.control_key() || self.modifiers.super_key();
        if let Key::Character(key) = &event.logical_key {
            if let Some(action) = ShortcutRegistry::action_for(key.as_str(), ctrl, self.modifiers.shift_key()) {
                self.run_action(event_loop, id, action);
                return;
            }
        }

        if ctrl {
            return;
        }
        if let Some(text) = event.text.filter(|text| !text.chars().all(char::is_control)) {
            if let Some(surface) = self.registry.surface(id) {
                surface.input(WidgetInput::Text(text.to_string()));
            }
        }
    }

    fn poll_hotkeys(&mut self, event_loop: &ActiveEventLoop) {
        let actions = match &self.hotkeys {
            Some(hotkeys) => hotkeys.poll(),
            None => return,
        };
        for action in actions {
            if action == ShortcutAction::NewWidget && !self.registry.is_shutting_down() {
                self.create_default_widget(event_loop);
            }
        }
    }

    fn tick_widgets(&mut self, now: Instant) {
        if now < self.next_tick {
            return;
        }
        for id in self.registry.ids() {
            if let Some(surface) = self.registry.surface(id) {
                surface.tick();
            }
        }
        self.next_tick = now + self.config.tick_interval;
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.restored {
            return;
        }
        self.restored = true;

        log::info!(
            "Settings: dictation={}, mutator={}, autostart={}",
            self.settings.voice_dictation_enabled,
            self.settings.ai_mutator_enabled,
            self.settings.autostart
        );

        match GlobalShortcuts::register(std::slice::from_ref(&self.config.new_widget_accelerator)) {
            Ok(hotkeys) => self.hotkeys = Some(hotkeys),
            Err(e) => log::warn!("Global accelerator unavailable: {}", e),
        }
        ShortcutRegistry::log_all();

        let factory = WinitFactory::new(event_loop, &self.proxy, self.settings);
        let restored = self.registry.restore_all(&factory);
        log::info!("{} widgets on screen", restored.len());

        if self.registry.live_count() == 0 {
            if self.hotkeys.is_some() {
                log::warn!(
                    "No widgets restored, press {} to create one",
                    self.config.new_widget_accelerator.format()
                );
            } else {
                log::error!("No widgets restored and no accelerator to create one, exiting");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(id) = self.widget_for_window(window_id) else {
            return;
        };

        match event {
            WindowEvent::Moved(_) | WindowEvent::Resized(_) => self.registry.on_geometry_changed(id),
            WindowEvent::CloseRequested => self.registry.on_close_requested(id),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, id, event),
            WindowEvent::Focused(focused) => log::trace!("Widget {} focused: {}", id, focused),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Widget { id, message } => {
                let factory = WinitFactory::new(event_loop, &self.proxy, self.settings);
                match self.registry.handle_widget_message(&factory, id, message) {
                    Ok(Some(created)) => log::info!("Widget {} opened widget {}", id, created),
                    Ok(None) => {}
                    Err(e) => log::error!("Widget {} request failed: {}", id, e),
                }
            }
            AppEvent::Destroyed { id } => {
                let removed = self.registry.on_destroyed(id);
                if removed && self.registry.live_count() == 0 && !cfg!(target_os = "macos") {
                    log::info!("Last widget closed, exiting");
                    event_loop.exit();
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.poll_hotkeys(event_loop);
        self.tick_widgets(now);
        self.registry.expire_close_deadlines(now);

        let wake = match self.registry.next_close_deadline() {
            Some(deadline) => deadline.min(self.next_tick),
            None => self.next_tick,
        };
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.registry.is_shutting_down() {
            self.registry.begin_shutdown();
            self.registry.close_all();
        }
        self.hotkeys = None;
        log::info!("UberNotes exiting");
    }
}
