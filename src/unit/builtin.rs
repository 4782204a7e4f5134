//! Built-in behavior units

use crate::observable::{Observable, Subscription};
use crate::unit::{BehaviorUnit, UnitBase, UnitResult};
use crate::{HostHandle, UnitKind};

// Type aliases to reduce complexity warnings
type LifecycleFn = Box<dyn FnMut() -> UnitResult>;
type ConfigurationFn<C> = Box<dyn FnMut(&C) -> UnitResult>;

/// Holds a single value for the owner.
///
/// The value is either given up front or produced by an initializer that
/// runs in `on_create`, where the host context is already available. Setting
/// the value never requests a render.
pub struct ValueUnit<T, C = ()> {
    base: UnitBase<C>,
    value: Option<T>,
    init: Option<Box<dyn FnOnce(&HostHandle<C>) -> T>>,
}

impl<T, C> ValueUnit<T, C> {
    pub fn new(value: T) -> Self {
        Self {
            base: UnitBase::new(),
            value: Some(value),
            init: None,
        }
    }

    /// Value produced when the unit is created
    pub fn lazy(init: impl FnOnce(&HostHandle<C>) -> T + 'static) -> Self {
        Self {
            base: UnitBase::new(),
            value: None,
            init: Some(Box::new(init)),
        }
    }

    /// # Panics
    ///
    /// Panics if a lazy value is read before `on_create`.
    pub fn get(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => panic!("ValueUnit read before its creation callback ran"),
        }
    }

    /// # Panics
    ///
    /// Panics if a lazy value is read before `on_create`.
    pub fn get_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => panic!("ValueUnit read before its creation callback ran"),
        }
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
        self.init = None;
    }

    /// Swap in a new value, returning the old one if there was one
    pub fn replace(&mut self, value: T) -> Option<T> {
        self.init = None;
        self.value.replace(value)
    }
}

impl<T, C> BehaviorUnit<C> for ValueUnit<T, C> {
    fn kind(&self) -> UnitKind {
        UnitKind::VALUE
    }

    fn base(&self) -> &UnitBase<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        &mut self.base
    }

    fn on_create(&mut self) -> UnitResult {
        if let Some(init) = self.init.take() {
            let value = init(self.base.expect_host());
            self.value = Some(value);
        }
        Ok(())
    }
}

/// Re-renders the owner every time its observable changes.
///
/// Owners keep the value in sync by writing through [`ObservableUnit::observable`].
pub struct ObservableUnit<T, C = ()> {
    base: UnitBase<C>,
    observable: Observable<T>,
    subscription: Option<Subscription>,
}

impl<T: Clone + 'static, C: 'static> ObservableUnit<T, C> {
    pub fn new(value: T) -> Self {
        Self::from_observable(Observable::new(value))
    }

    /// Track an observable created elsewhere
    pub fn from_observable(observable: Observable<T>) -> Self {
        Self {
            base: UnitBase::new(),
            observable,
            subscription: None,
        }
    }

    /// Handle to the tracked observable
    pub fn observable(&self) -> Observable<T> {
        self.observable.clone()
    }

    pub fn get(&self) -> T {
        self.observable.get()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl<T: Clone + 'static, C: 'static> BehaviorUnit<C> for ObservableUnit<T, C> {
    fn kind(&self) -> UnitKind {
        UnitKind::OBSERVABLE
    }

    fn base(&self) -> &UnitBase<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        &mut self.base
    }

    fn on_create(&mut self) -> UnitResult {
        let host = self.base.expect_host().clone();
        self.subscription = Some(self.observable.subscribe(move |_| host.request_render(|| {})));
        Ok(())
    }

    fn on_dispose(&mut self) -> UnitResult {
        self.observable.dispose();
        self.subscription = None;
        Ok(())
    }
}

/// Runs an optional closure for each lifecycle event.
///
/// Handy for one-off logic that does not deserve its own unit type. Absent
/// closures are skipped.
///
/// ```rust
/// use behavior_host::prelude::*;
///
/// let unit: CallbackUnit = CallbackUnit::new()
///     .with_create(|| Ok(()))
///     .with_dispose(|| anyhow::bail!("listener already gone"));
/// ```
pub struct CallbackUnit<C = ()> {
    base: UnitBase<C>,
    kind: UnitKind,
    on_create: Option<LifecycleFn>,
    on_dependencies_changed: Option<LifecycleFn>,
    on_configuration_update: Option<ConfigurationFn<C>>,
    on_reassemble: Option<LifecycleFn>,
    on_deactivate: Option<LifecycleFn>,
    on_dispose: Option<LifecycleFn>,
}

impl<C> Default for CallbackUnit<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CallbackUnit<C> {
    pub fn new() -> Self {
        Self {
            base: UnitBase::new(),
            kind: UnitKind::CALLBACK,
            on_create: None,
            on_dependencies_changed: None,
            on_configuration_update: None,
            on_reassemble: None,
            on_deactivate: None,
            on_dispose: None,
        }
    }

    /// Report failures under a different kind
    pub fn with_kind(mut self, kind: impl Into<UnitKind>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_create(mut self, f: impl FnMut() -> UnitResult + 'static) -> Self {
        self.on_create = Some(Box::new(f));
        self
    }

    pub fn with_dependencies_changed(mut self, f: impl FnMut() -> UnitResult + 'static) -> Self {
        self.on_dependencies_changed = Some(Box::new(f));
        self
    }

    pub fn with_configuration_update(mut self, f: impl FnMut(&C) -> UnitResult + 'static) -> Self {
        self.on_configuration_update = Some(Box::new(f));
        self
    }

    pub fn with_reassemble(mut self, f: impl FnMut() -> UnitResult + 'static) -> Self {
        self.on_reassemble = Some(Box::new(f));
        self
    }

    pub fn with_deactivate(mut self, f: impl FnMut() -> UnitResult + 'static) -> Self {
        self.on_deactivate = Some(Box::new(f));
        self
    }

    pub fn with_dispose(mut self, f: impl FnMut() -> UnitResult + 'static) -> Self {
        self.on_dispose = Some(Box::new(f));
        self
    }
}

fn run(callback: &mut Option<LifecycleFn>) -> UnitResult {
    match callback {
        Some(f) => f(),
        None => Ok(()),
    }
}

impl<C> BehaviorUnit<C> for CallbackUnit<C> {
    fn kind(&self) -> UnitKind {
        self.kind.clone()
    }

    fn base(&self) -> &UnitBase<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        &mut self.base
    }

    fn on_create(&mut self) -> UnitResult {
        run(&mut self.on_create)
    }

    fn on_dependencies_changed(&mut self) -> UnitResult {
        run(&mut self.on_dependencies_changed)
    }

    fn on_configuration_update(&mut self, old: &C) -> UnitResult {
        match &mut self.on_configuration_update {
            Some(f) => f(old),
            None => Ok(()),
        }
    }

    fn on_reassemble(&mut self) -> UnitResult {
        run(&mut self.on_reassemble)
    }

    fn on_deactivate(&mut self) -> UnitResult {
        run(&mut self.on_deactivate)
    }

    fn on_dispose(&mut self) -> UnitResult {
        run(&mut self.on_dispose)
    }
}

/// Relays every lifecycle call to one child unit, unchanged.
///
/// Attaching the forwarding unit attaches the child to the same host, so a
/// chain of forwarding units is installed through its outermost link only.
/// Decorators embed a `ForwardingUnit` and override the calls they care about.
pub struct ForwardingUnit<U, C = ()> {
    base: UnitBase<C>,
    child: U,
}

impl<U: BehaviorUnit<C>, C> ForwardingUnit<U, C> {
    pub fn new(child: U) -> Self {
        Self {
            base: UnitBase::new(),
            child,
        }
    }

    pub fn child(&self) -> &U {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut U {
        &mut self.child
    }

    pub fn into_child(self) -> U {
        self.child
    }
}

impl<U: BehaviorUnit<C>, C> BehaviorUnit<C> for ForwardingUnit<U, C> {
    fn kind(&self) -> UnitKind {
        self.child.kind()
    }

    fn base(&self) -> &UnitBase<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        &mut self.base
    }

    fn attach(&mut self, host: HostHandle<C>) {
        self.base.attach(host.clone());
        self.child.attach(host);
    }

    fn on_create(&mut self) -> UnitResult {
        self.child.on_create()
    }

    fn on_dependencies_changed(&mut self) -> UnitResult {
        self.child.on_dependencies_changed()
    }

    fn on_configuration_update(&mut self, old: &C) -> UnitResult {
        self.child.on_configuration_update(old)
    }

    fn on_reassemble(&mut self) -> UnitResult {
        self.child.on_reassemble()
    }

    fn on_deactivate(&mut self) -> UnitResult {
        self.child.on_deactivate()
    }

    fn on_dispose(&mut self) -> UnitResult {
        self.child.on_dispose()
    }

    fn request_render(&self, mutate: &mut dyn FnMut()) {
        self.child.request_render(mutate)
    }
}

/// Decorator that emits a `tracing` event for each lifecycle call, then forwards it
pub struct TracedUnit<U, C = ()> {
    inner: ForwardingUnit<U, C>,
    name: String,
}

impl<U: BehaviorUnit<C>, C> TracedUnit<U, C> {
    pub fn new(name: impl Into<String>, child: U) -> Self {
        Self {
            inner: ForwardingUnit::new(child),
            name: name.into(),
        }
    }

    pub fn child(&self) -> &U {
        self.inner.child()
    }

    pub fn child_mut(&mut self) -> &mut U {
        self.inner.child_mut()
    }

    fn trace(&self, event: &str) {
        let host = self.inner.host().map(HostHandle::label).unwrap_or_default();
        tracing::debug!(unit = %self.name, kind = %self.inner.kind(), %host, event, "lifecycle call");
    }
}

impl<U: BehaviorUnit<C>, C> BehaviorUnit<C> for TracedUnit<U, C> {
    fn kind(&self) -> UnitKind {
        self.inner.kind()
    }

    fn base(&self) -> &UnitBase<C> {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        self.inner.base_mut()
    }

    fn attach(&mut self, host: HostHandle<C>) {
        self.inner.attach(host)
    }

    fn on_create(&mut self) -> UnitResult {
        self.trace("create");
        self.inner.on_create()
    }

    fn on_dependencies_changed(&mut self) -> UnitResult {
        self.trace("dependencies_changed");
        self.inner.on_dependencies_changed()
    }

    fn on_configuration_update(&mut self, old: &C) -> UnitResult {
        self.trace("configuration_update");
        self.inner.on_configuration_update(old)
    }

    fn on_reassemble(&mut self) -> UnitResult {
        self.trace("reassemble");
        self.inner.on_reassemble()
    }

    fn on_deactivate(&mut self) -> UnitResult {
        self.trace("deactivate");
        self.inner.on_deactivate()
    }

    fn on_dispose(&mut self) -> UnitResult {
        self.trace("dispose");
        self.inner.on_dispose()
    }

    fn request_render(&self, mutate: &mut dyn FnMut()) {
        self.inner.request_render(mutate)
    }
}
