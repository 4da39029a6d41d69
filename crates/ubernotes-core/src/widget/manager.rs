//! Widget registry: identity allocation, instance tracking and persistence.

use super::config::{ResolvedConfig, WidgetOptions};
use super::state::Lifecycle;
use super::surface::{SurfaceError, SurfaceFactory, SurfaceSpec, WidgetSurface};
use super::{WidgetId, WidgetRecord};
use crate::bridge::{HostMessage, SaveToken, WidgetMessage};
use crate::geometry::{Bounds, Position, Size};
use crate::storage::{Store, WIDGETS_NAMESPACE, widget_key};
use crate::template::TemplateRegistry;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long a closing widget may take to report its content before the
/// surface is closed without a final save.
pub const DEFAULT_CLOSE_SAVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Known templates and the fallback used for defaults and empty restores.
    pub templates: TemplateRegistry,
    /// Upper bound on waiting for the final save of a closing widget.
    pub close_save_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            templates: TemplateRegistry::builtin(),
            close_save_timeout: DEFAULT_CLOSE_SAVE_TIMEOUT,
        }
    }
}

/// An outstanding content round trip.
#[derive(Debug, Clone, Copy)]
struct PendingSave {
    token: SaveToken,
    /// Geometry captured when the save was requested.
    bounds: Bounds,
}

struct Instance<W> {
    surface: W,
    template: String,
    lifecycle: Lifecycle,
    /// `Init` waiting for the widget to report ready. Taken exactly once.
    init: Option<HostMessage>,
    pending_save: Option<PendingSave>,
    close_deadline: Option<Instant>,
}

/// Host-side authority over live widgets.
///
/// Owned by the event loop thread. All mutation goes through `&mut self`, so
/// the identity counter and the live set can never drift apart.
pub struct WidgetRegistry<S: Store + ?Sized, W: WidgetSurface> {
    store: Arc<S>,
    templates: TemplateRegistry,
    close_save_timeout: Duration,
    instances: BTreeMap<WidgetId, Instance<W>>,
    next_id: u64,
    next_token: u64,
    shutting_down: bool,
    rng: StdRng,
}

impl<S: Store + ?Sized, W: WidgetSurface> WidgetRegistry<S, W> {
    /// Create a registry over `store`.
    pub fn new(store: Arc<S>, config: RegistryConfig) -> Self {
        Self {
            store,
            templates: config.templates,
            close_save_timeout: config.close_save_timeout,
            instances: BTreeMap::new(),
            next_id: 1,
            next_token: 1,
            shutting_down: false,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the placement RNG (deterministic placement in tests).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Create a widget with a freshly allocated identity.
    pub fn create_widget<F>(&mut self, factory: &F, options: WidgetOptions) -> RegistryResult<WidgetId>
    where
        F: SurfaceFactory<Surface = W>,
    {
        let id = self.allocate_id(None);
        self.instantiate(factory, id, options)
    }

    /// Recreate one widget per persisted record, or one fallback widget when
    /// the store holds no widget records at all.
    ///
    /// Must not be called while widgets are live. Records that fail to parse
    /// are skipped; a surface failure for one record does not stop the rest.
    pub fn restore_all<F>(&mut self, factory: &F) -> Vec<WidgetId>
    where
        F: SurfaceFactory<Surface = W>,
    {
        if !self.instances.is_empty() {
            log::warn!("Restoring widgets while {} are already live", self.instances.len());
        }

        let entries = self.store.enumerate(WIDGETS_NAMESPACE);
        let store_empty = entries.is_empty();
        let mut records = Vec::new();
        let mut highest_key = 0;
        for (key, value) in entries {
            let Some(id) = WidgetId::from_store_key(&key) else {
                log::warn!("Skipping widget record with invalid key {:?}", key);
                continue;
            };
            highest_key = highest_key.max(id.0);
            match WidgetOptions::from_stored(&value) {
                Some(options) => records.push((id, options)),
                None => log::warn!("Skipping malformed widget record {}", key),
            }
        }
        records.sort_by_key(|(id, _)| *id);

        let mut restored = Vec::with_capacity(records.len().max(1));
        for (saved_id, options) in records {
            let id = self.allocate_id(Some(saved_id));
            match self.instantiate(factory, id, options) {
                Ok(id) => restored.push(id),
                Err(e) => log::error!("Failed to restore widget {}: {}", saved_id, e),
            }
        }
        self.next_id = self.next_id.max(highest_key.saturating_add(1));

        if store_empty && self.instances.is_empty() {
            let fallback = self.templates.fallback_key().to_string();
            log::info!("No saved widgets, creating a {} widget", fallback);
            match self.create_widget(factory, WidgetOptions::new().with_template(fallback)) {
                Ok(id) => restored.push(id),
                Err(e) => log::error!("Failed to create default widget: {}", e),
            }
        } else {
            log::info!("Restored {} widgets", restored.len());
        }

        restored
    }

    /// Start a content round trip that ends in a store write for `id`.
    ///
    /// Returns the save token, or `None` when the widget is not live or has
    /// not received its `Init` yet. A newer persist for the same widget
    /// supersedes an outstanding one.
    pub fn persist(&mut self, id: WidgetId) -> Option<SaveToken> {
        let instance = self.instances.get(&id)?;
        if !instance.lifecycle.is_live() {
            return None;
        }
        if instance.init.is_some() {
            // Its content would still be empty and overwrite the stored record.
            log::trace!("Widget {} not initialized, skipping save", id);
            return None;
        }
        self.request_save(id)
    }

    /// Write widget content through immediately, keeping the saved geometry.
    pub fn save_content(&mut self, id: WidgetId, content: String) {
        let Some(instance) = self.instances.get(&id) else {
            log::debug!("Ignoring content for unknown widget {}", id);
            return;
        };

        let live = instance.surface.bounds();
        let saved = self.load_options(id).unwrap_or_default();
        let position = match (saved.x, saved.y) {
            (Some(x), Some(y)) => Position::new(x, y),
            _ => live.position,
        };
        let size = match (saved.width, saved.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Size::new(width, height),
            _ => live.size,
        };
        let template = instance.template.clone();
        self.write_record(id, Bounds::new(position, size), content, template);
    }

    /// A live widget was moved or resized.
    pub fn on_geometry_changed(&mut self, id: WidgetId) {
        if self.persist(id).is_none() {
            log::trace!("Geometry change for non-live widget {}", id);
        }
    }

    /// The user or the host asked to close a widget.
    ///
    /// Outside shutdown the widget is saved first and its surface closed once
    /// the save lands (or the close deadline passes). The entry stays until
    /// [`on_destroyed`](Self::on_destroyed).
    pub fn on_close_requested(&mut self, id: WidgetId) {
        let shutting_down = self.shutting_down;
        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };
        if !instance.lifecycle.advance(Lifecycle::Closing) {
            return;
        }

        if shutting_down || instance.init.is_some() {
            log::debug!(
                "Closing widget {} without saving ({})",
                id,
                if shutting_down { "shutdown" } else { "not initialized" }
            );
            instance.pending_save = None;
            instance.surface.close();
            return;
        }

        log::debug!("Closing widget {}, saving first", id);
        instance.close_deadline = Some(Instant::now() + self.close_save_timeout);
        self.request_save(id);
    }

    /// The platform confirmed a surface is gone. Outstanding saves are dropped.
    pub fn on_destroyed(&mut self, id: WidgetId) -> bool {
        let Some(mut instance) = self.instances.remove(&id) else {
            return false;
        };
        instance.lifecycle.advance(Lifecycle::Destroyed);
        if let Some(pending) = instance.pending_save {
            log::debug!("Widget {} destroyed with save {} outstanding, discarding", id, pending.token);
        }
        log::info!("Widget {} destroyed ({} live)", id, self.instances.len());
        true
    }

    /// Close closing widgets whose final save did not arrive in time.
    pub fn expire_close_deadlines(&mut self, now: Instant) {
        for (id, instance) in self.instances.iter_mut() {
            let expired = instance.close_deadline.is_some_and(|deadline| deadline <= now);
            if expired && instance.lifecycle.is_closing() {
                log::warn!("Widget {} did not report content before closing", id);
                instance.pending_save = None;
                instance.close_deadline = None;
                instance.surface.close();
            }
        }
    }

    /// Earliest close deadline, for scheduling the next wake-up.
    pub fn next_close_deadline(&self) -> Option<Instant> {
        self.instances.values().filter_map(|instance| instance.close_deadline).min()
    }

    /// Route a message from widget `id`.
    ///
    /// Returns the identity of a widget created in response, if any.
    pub fn handle_widget_message<F>(
        &mut self,
        factory: &F,
        id: WidgetId,
        message: WidgetMessage,
    ) -> RegistryResult<Option<WidgetId>>
    where
        F: SurfaceFactory<Surface = W>,
    {
        match message {
            WidgetMessage::Ready => {
                self.send_init(id);
                Ok(None)
            }
            WidgetMessage::ContentReport { token, content } => {
                self.complete_save(id, token, content);
                Ok(None)
            }
            WidgetMessage::RequestCreate => {
                let created = self.create_widget(factory, WidgetOptions::new())?;
                Ok(Some(created))
            }
            WidgetMessage::RequestClose => {
                self.on_close_requested(id);
                Ok(None)
            }
            WidgetMessage::RequestSaveContent { content } => {
                self.save_content(id, content);
                Ok(None)
            }
        }
    }

    /// Enter the shutdown phase: later closes skip persistence.
    pub fn begin_shutdown(&mut self) {
        log::info!("Registry entering shutdown");
        self.shutting_down = true;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Close every live surface and forget them without waiting.
    pub fn close_all(&mut self) {
        let count = self.instances.len();
        for (_, mut instance) in std::mem::take(&mut self.instances) {
            instance.surface.close();
        }
        log::info!("Closed {} widgets", count);
    }

    /// Number of tracked instances (live or closing).
    pub fn live_count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_live(&self, id: WidgetId) -> bool {
        self.lifecycle(id).is_some_and(|state| state.is_live())
    }

    /// Lifecycle of a tracked instance; `None` once destroyed.
    pub fn lifecycle(&self, id: WidgetId) -> Option<Lifecycle> {
        self.instances.get(&id).map(|instance| instance.lifecycle)
    }

    pub fn template_of(&self, id: WidgetId) -> Option<&str> {
        self.instances.get(&id).map(|instance| instance.template.as_str())
    }

    /// Tracked identities in ascending order.
    pub fn ids(&self) -> Vec<WidgetId> {
        self.instances.keys().copied().collect()
    }

    pub fn surface(&self, id: WidgetId) -> Option<&W> {
        self.instances.get(&id).map(|instance| &instance.surface)
    }

    /// Token of the outstanding save for `id`, if any.
    pub fn pending_save(&self, id: WidgetId) -> Option<SaveToken> {
        self.instances.get(&id)?.pending_save.map(|pending| pending.token)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn allocate_id(&mut self, hint: Option<WidgetId>) -> WidgetId {
        let id = hint.map_or(self.next_id, |hint| hint.0.max(self.next_id));
        self.next_id = id.saturating_add(1);
        WidgetId(id)
    }

    fn instantiate<F>(&mut self, factory: &F, id: WidgetId, options: WidgetOptions) -> RegistryResult<WidgetId>
    where
        F: SurfaceFactory<Surface = W>,
    {
        let persisted = self.load_options(id);
        let resolved = ResolvedConfig::resolve(
            &options,
            persisted.as_ref(),
            &self.templates,
            factory.primary_work_area(),
            &mut self.rng,
        );

        let spec = SurfaceSpec {
            id,
            title: resolved.template.title.clone(),
            template: resolved.template.key.clone(),
            bounds: Bounds::new(resolved.position, resolved.size),
        };
        let surface = factory.create_surface(&spec)?;

        let mut instance = Instance {
            surface,
            template: spec.template.clone(),
            lifecycle: Lifecycle::Created,
            init: Some(HostMessage::Init {
                identity: id,
                content: resolved.content,
                template: spec.template.clone(),
            }),
            pending_save: None,
            close_deadline: None,
        };
        instance.lifecycle.advance(Lifecycle::Live);
        self.instances.insert(id, instance);

        log::info!(
            "Created widget {} ({}) at ({}, {}) size {}x{}",
            id,
            spec.template,
            spec.bounds.position.x,
            spec.bounds.position.y,
            spec.bounds.size.width,
            spec.bounds.size.height
        );
        Ok(id)
    }

    fn send_init(&mut self, id: WidgetId) {
        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };
        match instance.init.take() {
            Some(init) => instance.surface.send(init),
            None => log::debug!("Widget {} reported ready again, init already sent", id),
        }
    }

    fn request_save(&mut self, id: WidgetId) -> Option<SaveToken> {
        let token = SaveToken(self.next_token);
        let instance = self.instances.get_mut(&id)?;
        self.next_token += 1;

        let bounds = instance.surface.bounds();
        if let Some(previous) = instance.pending_save.replace(PendingSave { token, bounds }) {
            log::trace!("Save {} for widget {} superseded by {}", previous.token, id, token);
        }
        instance.surface.send(HostMessage::RequestContentForSave { token });
        Some(token)
    }

    fn complete_save(&mut self, id: WidgetId, token: SaveToken, content: String) {
        let Some(instance) = self.instances.get_mut(&id) else {
            log::debug!("Discarding content report {} for destroyed widget {}", token, id);
            return;
        };
        let pending = match instance.pending_save {
            Some(pending) if pending.token == token => pending,
            _ => {
                log::debug!("Discarding stale content report {} for widget {}", token, id);
                return;
            }
        };
        instance.pending_save = None;
        let template = instance.template.clone();

        self.write_record(id, pending.bounds, content, template);

        if let Some(instance) = self.instances.get_mut(&id) {
            if instance.lifecycle.is_closing() {
                instance.close_deadline = None;
                instance.surface.close();
            }
        }
    }

    fn load_options(&self, id: WidgetId) -> Option<WidgetOptions> {
        let value = self.store.get(&widget_key(id))?;
        let options = WidgetOptions::from_stored(&value);
        if options.is_none() {
            log::warn!("Ignoring malformed record for widget {}", id);
        }
        options
    }

    fn write_record(&self, id: WidgetId, bounds: Bounds, content: String, template: String) {
        let template = self
            .load_options(id)
            .and_then(|saved| saved.template)
            .unwrap_or(template);
        let record = WidgetRecord {
            position: bounds.position,
            size: bounds.size,
            content,
            template,
        };

        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to serialize widget {}: {}", id, e);
                return;
            }
        };
        match self.store.set(&widget_key(id), value) {
            Ok(()) => log::debug!(
                "Saved widget {} at ({}, {}) size {}x{}",
                id,
                bounds.position.x,
                bounds.position.y,
                bounds.size.width,
                bounds.size.height
            ),
            Err(e) => log::warn!("Failed to save widget {}: {}", id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::widget::mock::{MockFactory, MockSurface};
    use serde_json::json;

    type Registry = WidgetRegistry<MemoryStore, MockSurface>;

    fn registry_with(store: Arc<MemoryStore>) -> Registry {
        WidgetRegistry::new(store, RegistryConfig::default()).with_rng(StdRng::seed_from_u64(42))
    }

    fn registry() -> (Registry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (registry_with(store.clone()), store)
    }

    fn last_token(factory: &MockFactory, id: WidgetId) -> SaveToken {
        factory
            .log(id)
            .sent
            .borrow()
            .iter()
            .rev()
            .find_map(|message| match message {
                HostMessage::RequestContentForSave { token } => Some(*token),
                _ => None,
            })
            .expect("no save requested")
    }

    fn report(registry: &mut Registry, factory: &MockFactory, id: WidgetId, token: SaveToken, content: &str) {
        registry
            .handle_widget_message(
                factory,
                id,
                WidgetMessage::ContentReport {
                    token,
                    content: content.to_string(),
                },
            )
            .unwrap();
    }

    fn ready(registry: &mut Registry, factory: &MockFactory, id: WidgetId) {
        registry.handle_widget_message(factory, id, WidgetMessage::Ready).unwrap();
    }

    fn create_ready(registry: &mut Registry, factory: &MockFactory) -> WidgetId {
        let id = registry.create_widget(factory, WidgetOptions::new()).unwrap();
        ready(registry, factory, id);
        id
    }

    fn resize(factory: &MockFactory, id: WidgetId, width: u32, height: u32) {
        let log = factory.log(id);
        let current = log.bounds.get();
        log.bounds.set(Bounds::new(current.position, Size::new(width, height)));
    }

    #[test]
    fn test_identities_strictly_increase() {
        let (mut registry, _) = registry();
        let factory = MockFactory::new();

        let ids: Vec<_> = (0..5)
            .map(|_| registry.create_widget(&factory, WidgetOptions::new()).unwrap())
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ids[0], WidgetId(1));

        registry.on_close_requested(ids[4]);
        registry.on_destroyed(ids[4]);
        let next = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        assert_eq!(next, WidgetId(6));
    }

    #[test]
    fn test_new_note_fits_work_area() {
        let (mut registry, _) = registry();
        let factory = MockFactory::new();

        for _ in 0..50 {
            registry
                .create_widget(&factory, WidgetOptions::new().with_template("note"))
                .unwrap();
        }
        for spec in factory.created.borrow().iter() {
            assert_eq!(spec.bounds.size, Size::new(300, 200));
            assert!(spec.bounds.position.x >= 0 && spec.bounds.position.y >= 0);
            assert!(factory.work_area.contains(&spec.bounds));
        }
    }

    #[test]
    fn test_explicit_size_overrides_persisted() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("widgets.1", json!({"x": 5, "y": 6, "width": 500, "height": 500, "content": "c", "template": "note"}))
            .unwrap();
        let mut registry = registry_with(store);
        let factory = MockFactory::new();

        registry
            .create_widget(&factory, WidgetOptions::new().with_size(320, 240))
            .unwrap();

        let spec = factory.created.borrow()[0].clone();
        assert_eq!(spec.bounds.size, Size::new(320, 240));
        assert_eq!(spec.bounds.position, Position::new(5, 6));
    }

    #[test]
    fn test_init_sent_once_after_ready() {
        let (mut registry, _) = registry();
        let factory = MockFactory::new();
        let id = registry
            .create_widget(&factory, WidgetOptions::new().with_content("draft"))
            .unwrap();

        assert!(factory.log(id).sent.borrow().is_empty());

        registry.handle_widget_message(&factory, id, WidgetMessage::Ready).unwrap();
        registry.handle_widget_message(&factory, id, WidgetMessage::Ready).unwrap();

        assert_eq!(
            registry.surface(id).unwrap().sent(),
            vec![HostMessage::Init {
                identity: id,
                content: "draft".to_string(),
                template: "note".to_string(),
            }]
        );
    }

    #[test]
    fn test_surface_failure_propagates() {
        let (mut registry, _) = registry();
        let factory = MockFactory::new();
        factory.fail.set(true);

        let result = registry.create_widget(&factory, WidgetOptions::new());
        assert!(matches!(result, Err(RegistryError::Surface(_))));
        assert_eq!(registry.live_count(), 0);

        factory.fail.set(false);
        let id = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        assert_eq!(id, WidgetId(2));
    }

    #[test]
    fn test_restore_empty_store_creates_fallback() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();

        let restored = registry.restore_all(&factory);
        assert_eq!(restored, vec![WidgetId(1)]);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.template_of(WidgetId(1)), Some("note"));
        assert!(store.enumerate("widgets").is_empty());
    }

    #[test]
    fn test_restore_records_keep_content_and_template() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("widgets.1", json!({"x": 10, "y": 10, "width": 300, "height": 200, "content": "first", "template": "note"}))
            .unwrap();
        store
            .set("widgets.4", json!({"x": 40, "y": 40, "width": 320, "height": 220, "content": "{\"location\":\"Oslo\"}", "template": "weather"}))
            .unwrap();
        let mut registry = registry_with(store);
        let factory = MockFactory::new();

        let restored = registry.restore_all(&factory);
        assert_eq!(restored, vec![WidgetId(1), WidgetId(4)]);

        for id in &restored {
            registry.handle_widget_message(&factory, *id, WidgetMessage::Ready).unwrap();
        }
        assert_eq!(
            factory.log(WidgetId(4)).sent.borrow()[0],
            HostMessage::Init {
                identity: WidgetId(4),
                content: "{\"location\":\"Oslo\"}".to_string(),
                template: "weather".to_string(),
            }
        );
        assert_eq!(registry.template_of(WidgetId(1)), Some("note"));

        let fresh = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        assert_eq!(fresh, WidgetId(5));
    }

    #[test]
    fn test_restore_skips_malformed_record() {
        let store = Arc::new(MemoryStore::new());
        store.set("widgets.1", json!({"content": "a", "template": "note"})).unwrap();
        store.set("widgets.2", json!("garbage")).unwrap();
        store.set("widgets.3", json!({"content": "c", "template": "note"})).unwrap();
        store.set("widgets.oops", json!({"content": "bad key"})).unwrap();
        let mut registry = registry_with(store);
        let factory = MockFactory::new();

        let restored = registry.restore_all(&factory);
        assert_eq!(restored, vec![WidgetId(1), WidgetId(3)]);
        assert_eq!(registry.live_count(), 2);

        let fresh = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        assert_eq!(fresh, WidgetId(4));
    }

    #[test]
    fn test_resize_then_persist_writes_record() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let restored = registry.restore_all(&factory);
        let id = restored[0];
        ready(&mut registry, &factory, id);

        resize(&factory, id, 400, 300);
        registry.on_geometry_changed(id);
        let token = last_token(&factory, id);
        report(&mut registry, &factory, id, token, "hello");

        let position = factory.log(id).bounds.get().position;
        assert_eq!(
            store.get("widgets.1"),
            Some(json!({
                "x": position.x,
                "y": position.y,
                "width": 400,
                "height": 300,
                "content": "hello",
                "template": "note"
            }))
        );
        assert_eq!(registry.pending_save(id), None);
    }

    #[test]
    fn test_persist_after_destroy_writes_nothing() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let id = create_ready(&mut registry, &factory);

        let token = registry.persist(id).unwrap();
        registry.on_destroyed(id);
        report(&mut registry, &factory, id, token, "late");

        assert_eq!(store.get("widgets.1"), None);
        assert_eq!(registry.persist(id), None);
    }

    #[test]
    fn test_superseded_save_is_discarded() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let id = create_ready(&mut registry, &factory);

        let first = registry.persist(id).unwrap();
        resize(&factory, id, 500, 350);
        let second = registry.persist(id).unwrap();
        assert!(second > first);

        report(&mut registry, &factory, id, second, "newest");
        report(&mut registry, &factory, id, first, "oldest");

        let saved = store.get("widgets.1").unwrap();
        assert_eq!(saved["content"], json!("newest"));
        assert_eq!(saved["width"], json!(500));
    }

    #[test]
    fn test_close_saves_then_closes_surface() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let first = create_ready(&mut registry, &factory);
        let second = registry.create_widget(&factory, WidgetOptions::new()).unwrap();

        registry.on_close_requested(first);
        assert_eq!(registry.lifecycle(first), Some(Lifecycle::Closing));
        assert_eq!(factory.log(first).close_calls.get(), 0);

        // Geometry events while closing do not start new saves.
        let token = last_token(&factory, first);
        registry.on_geometry_changed(first);
        assert_eq!(last_token(&factory, first), token);

        report(&mut registry, &factory, first, token, "bye");
        assert_eq!(factory.log(first).close_calls.get(), 1);
        assert_eq!(registry.live_count(), 2);

        assert!(registry.on_destroyed(first));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(store.get("widgets.1").unwrap()["content"], json!("bye"));
        assert_eq!(store.get(&widget_key(second)), None);
    }

    #[test]
    fn test_closed_record_survives() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let first = create_ready(&mut registry, &factory);
        let second = registry.create_widget(&factory, WidgetOptions::new()).unwrap();

        registry.save_content(second, "keep me".to_string());
        let token = registry.persist(first).unwrap();
        report(&mut registry, &factory, first, token, "one");
        let before = store.get("widgets.2");

        registry.on_close_requested(first);
        let token = last_token(&factory, first);
        report(&mut registry, &factory, first, token, "one, final");
        registry.on_destroyed(first);

        assert_eq!(store.get("widgets.1").unwrap()["content"], json!("one, final"));
        assert_eq!(store.get("widgets.2"), before);
    }

    #[test]
    fn test_close_during_shutdown_skips_save() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let id = registry.create_widget(&factory, WidgetOptions::new()).unwrap();

        registry.begin_shutdown();
        registry.on_close_requested(id);

        assert!(factory.log(id).sent.borrow().is_empty());
        assert_eq!(factory.log(id).close_calls.get(), 1);
        registry.on_destroyed(id);
        assert_eq!(store.get("widgets.1"), None);
    }

    #[test]
    fn test_close_deadline_expires() {
        let store = Arc::new(MemoryStore::new());
        let config = RegistryConfig {
            close_save_timeout: Duration::from_millis(10),
            ..RegistryConfig::default()
        };
        let mut registry: Registry = WidgetRegistry::new(store.clone(), config);
        let factory = MockFactory::new();
        let id = create_ready(&mut registry, &factory);

        registry.on_close_requested(id);
        let deadline = registry.next_close_deadline().unwrap();

        registry.expire_close_deadlines(deadline - Duration::from_millis(5));
        assert_eq!(factory.log(id).close_calls.get(), 0);

        registry.expire_close_deadlines(deadline);
        assert_eq!(factory.log(id).close_calls.get(), 1);
        assert_eq!(registry.next_close_deadline(), None);

        let token = last_token(&factory, id);
        report(&mut registry, &factory, id, token, "too late");
        assert_eq!(store.get("widgets.1"), None);
    }

    #[test]
    fn test_close_all_clears_without_saving() {
        let (mut registry, store) = registry();
        let factory = MockFactory::new();
        let ids: Vec<_> = (0..3)
            .map(|_| registry.create_widget(&factory, WidgetOptions::new()).unwrap())
            .collect();

        registry.close_all();

        assert_eq!(registry.live_count(), 0);
        for id in ids {
            assert_eq!(factory.log(id).close_calls.get(), 1);
            assert!(!registry.on_destroyed(id));
        }
        assert!(store.enumerate("widgets").is_empty());
    }

    #[test]
    fn test_save_content_keeps_saved_geometry() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("widgets.1", json!({"x": 1, "y": 2, "width": 310, "height": 210, "content": "old", "template": "note"}))
            .unwrap();
        let mut registry = registry_with(store.clone());
        let factory = MockFactory::new();
        let id = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        resize(&factory, id, 640, 480);

        registry
            .handle_widget_message(
                &factory,
                id,
                WidgetMessage::RequestSaveContent {
                    content: "new".to_string(),
                },
            )
            .unwrap();

        assert_eq!(
            store.get("widgets.1"),
            Some(json!({"x": 1, "y": 2, "width": 310, "height": 210, "content": "new", "template": "note"}))
        );
    }

    #[test]
    fn test_widget_requests_create_and_close() {
        let (mut registry, _) = registry();
        let factory = MockFactory::new();
        let id = registry.create_widget(&factory, WidgetOptions::new()).unwrap();

        let created = registry
            .handle_widget_message(&factory, id, WidgetMessage::RequestCreate)
            .unwrap();
        assert_eq!(created, Some(WidgetId(2)));

        registry
            .handle_widget_message(&factory, id, WidgetMessage::RequestClose)
            .unwrap();
        assert_eq!(registry.lifecycle(id), Some(Lifecycle::Closing));
        assert!(registry.is_live(WidgetId(2)));
    }

    #[test]
    fn test_geometry_before_ready_keeps_restored_content() {
        let store = Arc::new(MemoryStore::new());
        let saved = json!({"x": 10, "y": 10, "width": 300, "height": 200, "content": "<p>important</p>", "template": "note"});
        store.set("widgets.1", saved.clone()).unwrap();
        let mut registry = registry_with(store.clone());
        let factory = MockFactory::new();
        let id = registry.restore_all(&factory)[0];

        resize(&factory, id, 310, 210);
        registry.on_geometry_changed(id);
        assert_eq!(registry.persist(id), None);
        assert_eq!(registry.pending_save(id), None);
        assert!(factory.log(id).sent.borrow().is_empty());
        assert_eq!(store.get("widgets.1"), Some(saved));

        ready(&mut registry, &factory, id);
        assert_eq!(
            factory.log(id).sent.borrow()[0],
            HostMessage::Init {
                identity: id,
                content: "<p>important</p>".to_string(),
                template: "note".to_string(),
            }
        );
        let token = registry.persist(id).unwrap();
        report(&mut registry, &factory, id, token, "<p>important</p>");
        assert_eq!(store.get("widgets.1").unwrap()["width"], json!(310));
    }

    #[test]
    fn test_close_before_ready_skips_save() {
        let store = Arc::new(MemoryStore::new());
        store.set("widgets.1", json!({"content": "kept", "template": "note"})).unwrap();
        let mut registry = registry_with(store.clone());
        let factory = MockFactory::new();
        let id = registry.restore_all(&factory)[0];

        registry.on_close_requested(id);
        assert!(factory.log(id).sent.borrow().is_empty());
        assert_eq!(factory.log(id).close_calls.get(), 1);
        assert_eq!(registry.next_close_deadline(), None);

        registry.on_destroyed(id);
        assert_eq!(store.get("widgets.1").unwrap()["content"], json!("kept"));
    }

    #[test]
    fn test_restore_malformed_only_store_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.set("widgets.1", json!("garbage")).unwrap();
        let mut registry = registry_with(store);
        let factory = MockFactory::new();

        assert!(registry.restore_all(&factory).is_empty());
        assert_eq!(registry.live_count(), 0);

        let fresh = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        assert_eq!(fresh, WidgetId(2));
    }

    #[test]
    fn test_restore_out_of_range_key_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("widgets.18446744073709551615", json!({"content": "huge", "template": "note"}))
            .unwrap();
        store.set("widgets.2", json!({"content": "two", "template": "note"})).unwrap();
        let mut registry = registry_with(store);
        let factory = MockFactory::new();

        assert_eq!(registry.restore_all(&factory), vec![WidgetId(2)]);
        let fresh = registry.create_widget(&factory, WidgetOptions::new()).unwrap();
        assert_eq!(fresh, WidgetId(3));
    }
}
