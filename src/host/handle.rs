use crate::spawner::UnitSpawner;
use crate::{LifecycleError, LifecycleResult};
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// The stateful component a host serves.
///
/// Implement this on the piece of owner state that can be borrowed while the
/// owner is dispatching lifecycle events, since units call back into it
/// synchronously from inside their callbacks.
pub trait Owner<C = ()> {
    /// Schedule another render of the owner
    fn mark_needs_render(&self);

    /// Current owner configuration
    fn configuration(&self) -> C;

    /// Whether the owner is still attached to its tree
    fn is_mounted(&self) -> bool {
        true
    }
}

/// Read-only contextual data the host exposes to its units
#[derive(Debug, Clone)]
pub struct UnitContext {
    /// Unique id of the owner this host serves
    pub owner_id: String,
    /// Host label, also used in failure reports
    pub label: String,
    /// Free-form data supplied through the host configuration
    pub metadata: HashMap<String, serde_json::Value>,
}

impl UnitContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            owner_id: uuid::Uuid::new_v4().to_string(),
            label: label.into(),
            metadata: HashMap::new(),
        }
    }

    /// Get metadata value by key
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }
}

pub(crate) struct HostShared<C> {
    owner: Weak<dyn Owner<C>>,
    context: RefCell<UnitContext>,
    spawner: Option<Rc<dyn UnitSpawner>>,
    disposed: Cell<bool>,
    render_requests: Cell<u64>,
}

/// A unit's back-reference to the host it is installed in.
///
/// Cloning yields another reference to the same host.
pub struct HostHandle<C> {
    shared: Rc<HostShared<C>>,
}

impl<C> Clone for HostHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<C> fmt::Debug for HostHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("label", &self.shared.context.borrow().label)
            .field("disposed", &self.shared.disposed.get())
            .field("render_requests", &self.shared.render_requests.get())
            .finish()
    }
}

impl<C> HostHandle<C> {
    pub(crate) fn new(
        owner: Weak<dyn Owner<C>>,
        context: UnitContext,
        spawner: Option<Rc<dyn UnitSpawner>>,
    ) -> Self {
        Self {
            shared: Rc::new(HostShared {
                owner,
                context: RefCell::new(context),
                spawner,
                disposed: Cell::new(false),
                render_requests: Cell::new(0),
            }),
        }
    }

    pub(crate) fn mark_disposed(&self) {
        self.shared.disposed.set(true);
    }

    fn owner(&self) -> Option<Rc<dyn Owner<C>>> {
        self.shared.owner.upgrade()
    }

    /// True while the host is not disposed and its owner is alive
    pub fn is_active(&self) -> bool {
        !self.shared.disposed.get() && self.shared.owner.strong_count() > 0
    }

    /// Apply `mutate`, then ask the owner to render again.
    ///
    /// # Panics
    ///
    /// Panics when the host was disposed or the owner is gone: a unit asking
    /// for a render at that point has a lifecycle bug.
    pub fn request_render<F: FnOnce()>(&self, mutate: F) {
        assert!(
            !self.shared.disposed.get(),
            "request_render called on disposed host '{}'",
            self.shared.context.borrow().label
        );
        let Some(owner) = self.owner() else {
            panic!(
                "request_render called after the owner of host '{}' was dropped",
                self.shared.context.borrow().label
            );
        };

        mutate();
        self.shared
            .render_requests
            .set(self.shared.render_requests.get() + 1);
        owner.mark_needs_render();
    }

    /// Number of render requests this host has passed to its owner
    pub fn render_requests(&self) -> u64 {
        self.shared.render_requests.get()
    }

    /// Owner configuration, while the owner is alive
    pub fn configuration(&self) -> Option<C> {
        self.owner().map(|owner| owner.configuration())
    }

    /// Whether the owner is alive, mounted and the host not disposed
    pub fn is_mounted(&self) -> bool {
        !self.shared.disposed.get() && self.owner().is_some_and(|owner| owner.is_mounted())
    }

    pub fn with_context<R>(&self, f: impl FnOnce(&UnitContext) -> R) -> R {
        f(&self.shared.context.borrow())
    }

    pub fn label(&self) -> String {
        self.shared.context.borrow().label.clone()
    }

    pub fn metadata(&self, key: &str) -> Option<serde_json::Value> {
        self.shared.context.borrow().get_metadata(key).cloned()
    }

    /// Run `task` on the host's local spawner
    pub fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> LifecycleResult<()> {
        match &self.shared.spawner {
            Some(spawner) => spawner.spawn_local(task),
            None => Err(LifecycleError::NoSpawner(self.label())),
        }
    }
}
