//! In-process surfaces for registry tests.

use super::{SurfaceError, SurfaceFactory, SurfaceSpec, WidgetId, WidgetSurface};
use crate::bridge::HostMessage;
use crate::geometry::{Bounds, Position, Size, WorkArea};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug)]
pub struct SurfaceLog {
    pub bounds: Cell<Bounds>,
    pub sent: RefCell<Vec<HostMessage>>,
    pub close_calls: Cell<usize>,
}

pub struct MockSurface {
    pub log: Rc<SurfaceLog>,
}

impl MockSurface {
    pub fn sent(&self) -> Vec<HostMessage> {
        self.log.sent.borrow().clone()
    }
}

impl WidgetSurface for MockSurface {
    fn bounds(&self) -> Bounds {
        self.log.bounds.get()
    }

    fn send(&self, message: HostMessage) {
        self.log.sent.borrow_mut().push(message);
    }

    fn close(&mut self) {
        self.log.close_calls.set(self.log.close_calls.get() + 1);
    }
}

pub struct MockFactory {
    pub work_area: WorkArea,
    pub fail: Cell<bool>,
    pub created: RefCell<Vec<SurfaceSpec>>,
    pub logs: RefCell<Vec<(WidgetId, Rc<SurfaceLog>)>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self {
            work_area: WorkArea::new(Position::new(0, 0), Size::new(1440, 900)),
            fail: Cell::new(false),
            created: RefCell::new(Vec::new()),
            logs: RefCell::new(Vec::new()),
        }
    }

    /// Log of the most recent surface created for `id`.
    pub fn log(&self, id: WidgetId) -> Rc<SurfaceLog> {
        self.logs
            .borrow()
            .iter()
            .rev()
            .find(|(logged, _)| *logged == id)
            .map(|(_, log)| log.clone())
            .expect("no surface created for id")
    }
}

impl SurfaceFactory for MockFactory {
    type Surface = MockSurface;

    fn primary_work_area(&self) -> WorkArea {
        self.work_area
    }

    fn create_surface(&self, spec: &SurfaceSpec) -> Result<MockSurface, SurfaceError> {
        if self.fail.get() {
            return Err(SurfaceError::Creation("display unavailable".to_string()));
        }
        let log = Rc::new(SurfaceLog {
            bounds: Cell::new(spec.bounds),
            sent: RefCell::new(Vec::new()),
            close_calls: Cell::new(0),
        });
        self.created.borrow_mut().push(spec.clone());
        self.logs.borrow_mut().push((spec.id, log.clone()));
        Ok(MockSurface { log })
    }
}
