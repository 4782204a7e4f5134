//! Owner and unit doubles for the unit tests

use crate::unit::{BehaviorUnit, UnitBase, UnitResult};
use crate::{LifecycleEvent, Owner, UnitKind};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub(crate) type CallLog = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
pub(crate) struct TestOwner {
    pub renders: Cell<u32>,
    pub config: RefCell<String>,
    pub mounted: Cell<bool>,
}

impl TestOwner {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            mounted: Cell::new(true),
            ..Self::default()
        })
    }
}

impl Owner<String> for TestOwner {
    fn mark_needs_render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn configuration(&self) -> String {
        self.config.borrow().clone()
    }

    fn is_mounted(&self) -> bool {
        self.mounted.get()
    }
}

/// Logs `"<name>:<event>"` for every lifecycle call and fails on request
pub(crate) struct Probe {
    base: UnitBase<String>,
    name: &'static str,
    log: CallLog,
    fail_on: Vec<LifecycleEvent>,
}

impl Probe {
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            base: UnitBase::new(),
            name,
            log: Rc::clone(log),
            fail_on: Vec::new(),
        }
    }

    pub fn failing_on(mut self, event: LifecycleEvent) -> Self {
        self.fail_on.push(event);
        self
    }

    fn record(&self, event: LifecycleEvent) -> UnitResult {
        self.log.borrow_mut().push(format!("{}:{}", self.name, event));
        if self.fail_on.contains(&event) {
            anyhow::bail!("{} refused {}", self.name, event);
        }
        Ok(())
    }
}

impl BehaviorUnit<String> for Probe {
    fn kind(&self) -> UnitKind {
        UnitKind::new(self.name)
    }

    fn base(&self) -> &UnitBase<String> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<String> {
        &mut self.base
    }

    fn on_create(&mut self) -> UnitResult {
        self.record(LifecycleEvent::Create)
    }

    fn on_dependencies_changed(&mut self) -> UnitResult {
        self.record(LifecycleEvent::DependenciesChanged)
    }

    fn on_configuration_update(&mut self, old: &String) -> UnitResult {
        self.log.borrow_mut().push(format!("{}:old={}", self.name, old));
        self.record(LifecycleEvent::ConfigurationUpdate)
    }

    fn on_reassemble(&mut self) -> UnitResult {
        self.record(LifecycleEvent::Reassemble)
    }

    fn on_deactivate(&mut self) -> UnitResult {
        self.record(LifecycleEvent::Deactivate)
    }

    fn on_dispose(&mut self) -> UnitResult {
        self.record(LifecycleEvent::Dispose)
    }
}

pub(crate) fn log_of(log: &CallLog) -> Vec<String> {
    log.borrow().clone()
}
