//! Widget-side end of the message bridge.
//!
//! One runtime drives one widget view on its own thread. It announces
//! `Ready`, applies `Init`, answers every `RequestContentForSave` with exactly
//! one `ContentReport`, and turns user actions into host requests. Content
//! requests that arrive before `Init` are answered once `Init` is applied.

use crate::throttle::SaveThrottle;
use crate::view::{InputOutcome, WidgetInput, WidgetView};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use ubernotes_core::{HostMessage, SaveToken, WidgetId, WidgetMessage};

/// Outbound half of the bridge.
pub trait HostLink: Send {
    /// Deliver a message to the host. Returns false once the host is gone.
    fn post(&self, message: WidgetMessage) -> bool;
}

impl HostLink for async_channel::Sender<WidgetMessage> {
    fn post(&self, message: WidgetMessage) -> bool {
        self.send_blocking(message).is_ok()
    }
}

/// Inbound events for a runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    Host(HostMessage),
    Input(WidgetInput),
    /// Periodic timer from the host loop.
    Tick,
}

/// Drives one widget view.
pub struct WidgetRuntime<L: HostLink> {
    view: Box<dyn WidgetView>,
    link: L,
    identity: Option<WidgetId>,
    template: Option<String>,
    throttle: SaveThrottle,
    /// Content requests received before `Init`.
    deferred: Vec<SaveToken>,
}

impl<L: HostLink + 'static> WidgetRuntime<L> {
    pub fn new(view: Box<dyn WidgetView>, link: L) -> Self {
        Self {
            view,
            link,
            identity: None,
            template: None,
            throttle: SaveThrottle::default(),
            deferred: Vec::new(),
        }
    }

    pub fn with_throttle(mut self, throttle: SaveThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Identity received in `Init`.
    pub fn identity(&self) -> Option<WidgetId> {
        self.identity
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Announce readiness to the host.
    pub fn start(&mut self) -> bool {
        self.link.post(WidgetMessage::Ready)
    }

    /// Process one event. Returns false once the host is unreachable.
    pub fn handle(&mut self, event: RuntimeEvent, now: Instant) -> bool {
        match event {
            RuntimeEvent::Host(HostMessage::Init {
                identity,
                content,
                template,
            }) => {
                log::debug!("Widget {} initialized as {}", identity, template);
                self.identity = Some(identity);
                self.template = Some(template);
                self.view.init(&content);
                std::mem::take(&mut self.deferred)
                    .into_iter()
                    .all(|token| self.report_content(token))
            }
            RuntimeEvent::Host(HostMessage::RequestContentForSave { token }) if self.identity.is_none() => {
                log::debug!("Content request {} before init, deferring", token);
                self.deferred.push(token);
                true
            }
            RuntimeEvent::Host(HostMessage::RequestContentForSave { token }) => self.report_content(token),
            // Nothing is pushed before init, or restored state would be overwritten.
            _ if self.identity.is_none() => true,
            RuntimeEvent::Input(WidgetInput::Close) => self.link.post(WidgetMessage::RequestClose),
            RuntimeEvent::Input(WidgetInput::NewWidget) => self.link.post(WidgetMessage::RequestCreate),
            RuntimeEvent::Input(input) => {
                let outcome = self.view.handle_input(input);
                self.content_changed(outcome, now)
            }
            RuntimeEvent::Tick => {
                let outcome = self.view.tick(now);
                if outcome == InputOutcome::Changed {
                    self.throttle.mark_dirty();
                }
                self.flush_throttled(now)
            }
        }
    }

    /// Run until the host drops the event channel.
    pub fn run(mut self, events: async_channel::Receiver<RuntimeEvent>) {
        if !self.start() {
            return;
        }
        while let Ok(event) = events.recv_blocking() {
            if !self.handle(event, Instant::now()) {
                break;
            }
        }
        log::debug!("Widget runtime {:?} stopped", self.identity);
    }

    /// Run on a dedicated thread.
    pub fn spawn(self, events: async_channel::Receiver<RuntimeEvent>, name: String) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new().name(name).spawn(move || self.run(events))
    }

    fn report_content(&self, token: SaveToken) -> bool {
        self.link.post(WidgetMessage::ContentReport {
            token,
            content: self.view.content(),
        })
    }

    fn content_changed(&mut self, outcome: InputOutcome, now: Instant) -> bool {
        if outcome != InputOutcome::Changed {
            return true;
        }
        if self.view.saves_immediately() {
            return self.link.post(WidgetMessage::RequestSaveContent {
                content: self.view.content(),
            });
        }
        self.throttle.mark_dirty();
        self.flush_throttled(now)
    }

    fn flush_throttled(&mut self, now: Instant) -> bool {
        if !self.throttle.should_save(now) {
            return true;
        }
        self.throttle.mark_saved(now);
        self.link.post(WidgetMessage::RequestSaveContent {
            content: self.view.content(),
        })
    }
}
