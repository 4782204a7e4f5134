//! # Unit Host
//!
//! The host owns an ordered collection of behavior units on behalf of one
//! owner and forwards the owner's lifecycle events to them.
//!
//! ## Owner protocol
//!
//! The owner keeps a [`UnitHost`] as a field and calls, at matching points of
//! its own lifecycle and after its own base behavior has run:
//!
//! 1. [`UnitHost::install`]: during setup, any number of times
//! 2. [`UnitHost::forward_dependencies_changed`]
//! 3. [`UnitHost::forward_configuration_update`], passing the old configuration
//! 4. [`UnitHost::forward_reassemble`]: any number of times
//! 5. [`UnitHost::forward_deactivate`]
//! 6. [`UnitHost::forward_dispose`]: exactly once, last
//!
//! ```rust
//! use behavior_host::prelude::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Screen {
//!     renders: Cell<u32>,
//! }
//!
//! impl Owner<()> for Screen {
//!     fn mark_needs_render(&self) {
//!         self.renders.set(self.renders.get() + 1);
//!     }
//!
//!     fn configuration(&self) {}
//! }
//!
//! let screen = Rc::new(Screen::default());
//! let mut host: UnitHost = UnitHost::builder().label("screen").build(&screen);
//!
//! let counter = host.install(ObservableUnit::new(0));
//! counter.borrow().observable().set(1);
//! assert_eq!(screen.renders.get(), 1);
//!
//! host.forward_dispose();
//! ```
//!
//! ## Ordering
//!
//! Every forwarding operation visits units in installation order, disposal
//! included. Later units are not guaranteed to outlive earlier ones during
//! teardown.
//!
//! ## Failure isolation
//!
//! Each unit callback runs to completion before the next one starts. An `Err`
//! from one unit is reported to the host's [`FailureSink`] tagged with the
//! unit kind and the event, and iteration continues. `install` appends the
//! unit even when its `on_create` fails.
//!
//! ## Preconditions
//!
//! Installing or forwarding after `forward_dispose`, and disposing twice,
//! panic.

use crate::failure::{FailureReport, FailureSink, process_sink};
use crate::spawner::UnitSpawner;
use crate::unit::{BehaviorUnit, UnitResult};
use crate::{LifecycleEvent, LifecycleResult, UnitKind};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

mod handle;

pub use handle::{HostHandle, Owner, UnitContext};

/// Shared, typed handle to an installed unit
pub type UnitCell<U> = Rc<RefCell<U>>;

/// Configuration for a unit host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Label used in logs and failure reports
    pub label: String,
    /// Emit a debug event for every forwarded lifecycle call
    pub trace_dispatch: bool,
    /// Data exposed to units through the host context
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            label: "host".to_string(),
            trace_dispatch: false,
            metadata: HashMap::new(),
        }
    }
}

impl HostConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> LifecycleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> LifecycleResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Builder for creating hosts
pub struct HostBuilder<C> {
    config: HostConfig,
    sink: Option<Arc<dyn FailureSink>>,
    spawner: Option<Rc<dyn UnitSpawner>>,
    _config_type: std::marker::PhantomData<fn() -> C>,
}

impl<C: 'static> Default for HostBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> HostBuilder<C> {
    pub fn new() -> Self {
        Self {
            config: HostConfig::default(),
            sink: None,
            spawner: None,
            _config_type: std::marker::PhantomData,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    pub fn trace_dispatch(mut self, enabled: bool) -> Self {
        self.config.trace_dispatch = enabled;
        self
    }

    /// Add one metadata entry to the host context
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.metadata.insert(key.into(), value);
        self
    }

    /// Override the failure sink for this host only
    pub fn sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Spawner used by units that run async work
    pub fn spawner<S: UnitSpawner + 'static>(mut self, spawner: S) -> Self {
        self.spawner = Some(Rc::new(spawner));
        self
    }

    /// Build a host serving `owner`.
    ///
    /// The host only keeps a weak reference: the owner's lifetime is managed
    /// by whoever created it.
    pub fn build<O: Owner<C> + 'static>(self, owner: &Rc<O>) -> UnitHost<C> {
        let owner: Rc<dyn Owner<C>> = owner.clone();
        let mut context = UnitContext::new(self.config.label.clone());
        context.metadata = self.config.metadata.clone();

        UnitHost {
            units: Vec::new(),
            handle: HostHandle::new(Rc::downgrade(&owner), context, self.spawner),
            sink: self.sink.unwrap_or_else(process_sink),
            config: self.config,
            disposed: false,
        }
    }
}

/// Owns a component's behavior units and forwards its lifecycle to them
pub struct UnitHost<C: 'static = ()> {
    units: Vec<Rc<RefCell<dyn BehaviorUnit<C>>>>,
    handle: HostHandle<C>,
    sink: Arc<dyn FailureSink>,
    config: HostConfig,
    disposed: bool,
}

impl<C: 'static> UnitHost<C> {
    /// Host with default configuration and the process failure sink
    pub fn new<O: Owner<C> + 'static>(owner: &Rc<O>) -> Self {
        HostBuilder::new().build(owner)
    }

    pub fn builder() -> HostBuilder<C> {
        HostBuilder::new()
    }

    /// Attach `unit`, run its `on_create` and append it to the collection.
    ///
    /// A creation failure goes to the failure sink; the unit is appended
    /// either way. Returns a shared handle so the owner can keep using the
    /// unit with its concrete type.
    ///
    /// # Panics
    ///
    /// Panics if the host was already disposed.
    pub fn install<U>(&mut self, mut unit: U) -> UnitCell<U>
    where
        U: BehaviorUnit<C> + 'static,
    {
        assert!(
            !self.disposed,
            "install called on disposed host '{}'",
            self.config.label
        );

        unit.attach(self.handle.clone());
        let kind = unit.kind();
        let cell = Rc::new(RefCell::new(unit));

        tracing::debug!(
            host = %self.config.label,
            unit = %kind,
            position = self.units.len(),
            "installing behavior unit"
        );

        let created = cell.borrow_mut().on_create();
        if let Err(error) = created {
            self.report(kind, LifecycleEvent::Create, error);
        }

        self.units.push(cell.clone());
        cell
    }

    pub fn forward_dependencies_changed(&self) {
        self.dispatch(LifecycleEvent::DependenciesChanged, |unit| {
            unit.on_dependencies_changed()
        });
    }

    pub fn forward_configuration_update(&self, old: &C) {
        self.dispatch(LifecycleEvent::ConfigurationUpdate, |unit| {
            unit.on_configuration_update(old)
        });
    }

    pub fn forward_reassemble(&self) {
        self.dispatch(LifecycleEvent::Reassemble, |unit| unit.on_reassemble());
    }

    pub fn forward_deactivate(&self) {
        self.dispatch(LifecycleEvent::Deactivate, |unit| unit.on_deactivate());
    }

    /// Dispose every unit in installation order, then retire the host.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn forward_dispose(&mut self) {
        self.dispatch(LifecycleEvent::Dispose, |unit| unit.on_dispose());
        self.disposed = true;
        self.handle.mark_disposed();

        tracing::info!(
            host = %self.config.label,
            units = self.units.len(),
            "host disposed"
        );
    }

    fn dispatch<F>(&self, event: LifecycleEvent, mut callback: F)
    where
        F: FnMut(&mut dyn BehaviorUnit<C>) -> UnitResult,
    {
        assert!(
            !self.disposed,
            "{} forwarded to disposed host '{}'",
            event, self.config.label
        );

        for unit in &self.units {
            let mut unit = unit.borrow_mut();
            if self.config.trace_dispatch {
                tracing::debug!(
                    host = %self.config.label,
                    unit = %unit.kind(),
                    %event,
                    "forwarding lifecycle event"
                );
            }
            if let Err(error) = callback(&mut *unit) {
                let kind = unit.kind();
                drop(unit);
                self.report(kind, event, error);
            }
        }
    }

    fn report(&self, unit: UnitKind, event: LifecycleEvent, error: anyhow::Error) {
        self.sink
            .report(FailureReport::new(unit, event, self.config.label.clone(), error));
    }

    /// Number of installed units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Kinds of the installed units, in installation order
    pub fn kinds(&self) -> Vec<UnitKind> {
        self.units.iter().map(|unit| unit.borrow().kind()).collect()
    }

    /// The back-reference handed to units
    pub fn handle(&self) -> &HostHandle<C> {
        &self.handle
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<C: 'static> std::fmt::Debug for UnitHost<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // A unit mid-dispatch is mutably borrowed; show it as busy.
        let units: Vec<String> = self
            .units
            .iter()
            .map(|unit| match unit.try_borrow() {
                Ok(unit) => unit.kind().to_string(),
                Err(_) => "<busy>".to_string(),
            })
            .collect();
        f.debug_struct("UnitHost")
            .field("label", &self.config.label)
            .field("units", &units)
            .field("disposed", &self.disposed)
            .finish()
    }
}
