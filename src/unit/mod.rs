//! # Behavior Units
//!
//! A behavior unit is a non-visual piece of reusable logic that takes part in
//! its owner's lifecycle. Units are installed into a
//! [`UnitHost`](crate::UnitHost), which forwards every lifecycle event to
//! them in installation order.
//!
//! ## Lifecycle
//!
//! ```text
//! constructed ──install──▶ attached ──on_create──▶ live ──on_dispose──▶ gone
//!                                                   │ ▲
//!                                                   └─┘ dependencies_changed,
//!                                                       configuration_update,
//!                                                       reassemble, deactivate
//! ```
//!
//! - The host reference is set exactly once, before `on_create`.
//! - `on_dispose` runs exactly once; there is no resurrection.
//! - Callbacks return [`UnitResult`]. An `Err` is caught by the host and sent
//!   to its failure sink; it never reaches the owner or sibling units.
//! - Panics are programming errors and are not caught.
//!
//! ## Writing a unit
//!
//! Embed a [`UnitBase`] and override only the callbacks you need:
//!
//! ```rust
//! use behavior_host::prelude::*;
//!
//! #[derive(Default)]
//! struct Ticker {
//!     base: UnitBase,
//!     ticks: u32,
//! }
//!
//! impl BehaviorUnit for Ticker {
//!     fn kind(&self) -> UnitKind {
//!         UnitKind::new("ticker")
//!     }
//!
//!     fn base(&self) -> &UnitBase {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut UnitBase {
//!         &mut self.base
//!     }
//!
//!     fn on_reassemble(&mut self) -> UnitResult {
//!         self.ticks = 0;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! ## Configuration
//!
//! `C` is the owner's configuration type. Units meant for reuse across owners
//! should stay generic over `C` and take new inputs through their own
//! `update(..)` method, called by the owner; `on_configuration_update` ties a
//! unit to one owner's configuration type.
//!
//! ## Built-in units
//!
//! - [`ValueUnit`]: holds one value, optionally created lazily
//! - [`ObservableUnit`]: re-renders the owner on every change of an observable
//! - [`CallbackUnit`]: optional closure per lifecycle event
//! - [`ForwardingUnit`]: relays everything to one child unit
//! - [`TracedUnit`]: forwarding decorator that logs each lifecycle call
//! - [`FutureUnit`]: tracks one future as an [`AsyncSnapshot`]
//! - [`StreamUnit`]: tracks one stream as an [`AsyncSnapshot`]

use crate::{HostHandle, UnitKind};

pub mod builtin;
pub mod future;
pub mod stream;

pub use builtin::{CallbackUnit, ForwardingUnit, ObservableUnit, TracedUnit, ValueUnit};
pub use future::{AsyncSnapshot, ConnectionState, FutureUnit, UnitFuture, unit_future};
pub use stream::{StreamUnit, UnitStream};

/// Outcome of a lifecycle callback
pub type UnitResult = anyhow::Result<()>;

/// Host back-reference shared by every unit implementation
pub struct UnitBase<C = ()> {
    host: Option<HostHandle<C>>,
}

impl<C> Default for UnitBase<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for UnitBase<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitBase")
            .field("host", &self.host)
            .finish()
    }
}

impl<C> UnitBase<C> {
    pub fn new() -> Self {
        Self { host: None }
    }

    /// Record the host.
    ///
    /// # Panics
    ///
    /// Panics if a host was already set.
    pub fn attach(&mut self, host: HostHandle<C>) {
        assert!(
            self.host.is_none(),
            "unit is already attached to host '{}'",
            self.host.as_ref().map(HostHandle::label).unwrap_or_default()
        );
        self.host = Some(host);
    }

    pub fn host(&self) -> Option<&HostHandle<C>> {
        self.host.as_ref()
    }

    /// Attached to a host that is still live
    pub fn is_attached(&self) -> bool {
        self.host.as_ref().is_some_and(HostHandle::is_active)
    }

    /// The host, for operations that require one.
    ///
    /// # Panics
    ///
    /// Panics if the unit was never installed.
    pub fn expect_host(&self) -> &HostHandle<C> {
        match &self.host {
            Some(host) => host,
            None => panic!("unit used before it was installed into a host"),
        }
    }
}

/// Lifecycle contract of a behavior unit.
///
/// All lifecycle callbacks default to doing nothing.
pub trait BehaviorUnit<C = ()> {
    /// Diagnostic tag used in failure reports
    fn kind(&self) -> UnitKind;

    fn base(&self) -> &UnitBase<C>;

    fn base_mut(&mut self) -> &mut UnitBase<C>;

    /// Set the host back-reference. Called once by the host before `on_create`.
    fn attach(&mut self, host: HostHandle<C>) {
        self.base_mut().attach(host);
    }

    fn host(&self) -> Option<&HostHandle<C>> {
        self.base().host()
    }

    /// Called once, right after the unit is installed
    fn on_create(&mut self) -> UnitResult {
        Ok(())
    }

    /// Called when something the owner depends on changed
    fn on_dependencies_changed(&mut self) -> UnitResult {
        Ok(())
    }

    /// Called with the previous configuration after the owner got a new one
    fn on_configuration_update(&mut self, _old: &C) -> UnitResult {
        Ok(())
    }

    /// Called on hot reload; may run any number of times
    fn on_reassemble(&mut self) -> UnitResult {
        Ok(())
    }

    /// Called when the owner leaves its tree
    fn on_deactivate(&mut self) -> UnitResult {
        Ok(())
    }

    /// Called exactly once, last
    fn on_dispose(&mut self) -> UnitResult {
        Ok(())
    }

    /// Apply `mutate` and ask the owner to render again.
    ///
    /// # Panics
    ///
    /// Panics before installation, after disposal, or once the owner is gone.
    fn request_render(&self, mutate: &mut dyn FnMut()) {
        self.base().expect_host().request_render(mutate);
    }
}

impl<C, U> BehaviorUnit<C> for Box<U>
where
    U: BehaviorUnit<C> + ?Sized,
{
    fn kind(&self) -> UnitKind {
        (**self).kind()
    }

    fn base(&self) -> &UnitBase<C> {
        (**self).base()
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        (**self).base_mut()
    }

    fn attach(&mut self, host: HostHandle<C>) {
        (**self).attach(host)
    }

    fn host(&self) -> Option<&HostHandle<C>> {
        (**self).host()
    }

    fn on_create(&mut self) -> UnitResult {
        (**self).on_create()
    }

    fn on_dependencies_changed(&mut self) -> UnitResult {
        (**self).on_dependencies_changed()
    }

    fn on_configuration_update(&mut self, old: &C) -> UnitResult {
        (**self).on_configuration_update(old)
    }

    fn on_reassemble(&mut self) -> UnitResult {
        (**self).on_reassemble()
    }

    fn on_deactivate(&mut self) -> UnitResult {
        (**self).on_deactivate()
    }

    fn on_dispose(&mut self) -> UnitResult {
        (**self).on_dispose()
    }

    fn request_render(&self, mutate: &mut dyn FnMut()) {
        (**self).request_render(mutate)
    }
}
