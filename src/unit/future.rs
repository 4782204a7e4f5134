//! # Future-backed unit
//!
//! [`FutureUnit`] follows one future and exposes its progress as an
//! [`AsyncSnapshot`], re-rendering the owner when it resolves.
//!
//! ## State machine
//!
//! ```text
//!            on_create / update(new)
//!   none ─────────────────────────────▶ waiting
//!    ▲                                    │ resolves (token still active)
//!    │ update(new): unsubscribe           ▼
//!    └──────────────────────────── done(value) | done(error)
//! ```
//!
//! ## Stale resolutions
//!
//! Every subscription takes a fresh generation number and the resolution task
//! captures it. A resolution is applied only if its generation is still the
//! active one, so a future replaced by `update` or outlived by `on_dispose`
//! resolves into nothing. The underlying future is never cancelled.

use crate::unit::{BehaviorUnit, UnitBase, UnitResult};
use crate::{HostHandle, LifecycleResult, UnitKind};
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

/// Shared future a [`FutureUnit`] can follow.
///
/// Identity is pointer identity: clones of one `UnitFuture` are the same
/// future.
pub type UnitFuture<T, E> = Shared<LocalBoxFuture<'static, Result<T, E>>>;

/// Wrap any local future for use with [`FutureUnit`]
pub fn unit_future<T, E, F>(future: F) -> UnitFuture<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    F: Future<Output = Result<T, E>> + 'static,
{
    future.boxed_local().shared()
}

/// Connection state of an async computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected to any computation
    None,
    /// Connected, no result yet
    Waiting,
    /// Connected and producing values (streams only)
    Active,
    /// Computation finished
    Done,
}

/// Immutable view of an async computation's latest state.
///
/// A `Done` snapshot always holds either data or an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncSnapshot<T, E> {
    state: ConnectionState,
    data: Option<T>,
    error: Option<E>,
}

impl<T, E> AsyncSnapshot<T, E> {
    /// No computation, no data
    pub fn nothing() -> Self {
        Self {
            state: ConnectionState::None,
            data: None,
            error: None,
        }
    }

    /// Connected, no data yet
    pub fn waiting() -> Self {
        Self {
            state: ConnectionState::Waiting,
            data: None,
            error: None,
        }
    }

    pub fn with_data(state: ConnectionState, data: T) -> Self {
        Self {
            state,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_error(state: ConnectionState, error: E) -> Self {
        Self {
            state,
            data: None,
            error: Some(error),
        }
    }

    /// Same data or error, different connection state.
    ///
    /// # Panics
    ///
    /// Panics when moving an empty snapshot to `Done`.
    pub fn in_state(self, state: ConnectionState) -> Self {
        assert!(
            state != ConnectionState::Done || self.data.is_some() || self.error.is_some(),
            "a done snapshot needs data or an error"
        );
        Self { state, ..self }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

struct Tracker<T, E> {
    snapshot: AsyncSnapshot<T, E>,
    active: Option<u64>,
    generation: u64,
}

/// Follows one future and re-renders the owner when it resolves.
///
/// The resolution task runs on the host's spawner. Swap the future with
/// [`FutureUnit::update`]; the unit ignores whatever the old one yields.
pub struct FutureUnit<T, E, C = ()> {
    base: UnitBase<C>,
    future: Option<UnitFuture<T, E>>,
    tracker: Rc<RefCell<Tracker<T, E>>>,
}

impl<T, E, C> FutureUnit<T, E, C>
where
    T: Clone + 'static,
    E: Clone + 'static,
    C: 'static,
{
    pub fn new(future: UnitFuture<T, E>) -> Self {
        Self::with_initial(Some(future), None)
    }

    /// Unit with an optional future and data to show until it resolves
    pub fn with_initial(future: Option<UnitFuture<T, E>>, initial_data: Option<T>) -> Self {
        let snapshot = match initial_data {
            Some(data) => AsyncSnapshot::with_data(ConnectionState::None, data),
            None => AsyncSnapshot::nothing(),
        };
        Self {
            base: UnitBase::new(),
            future,
            tracker: Rc::new(RefCell::new(Tracker {
                snapshot,
                active: None,
                generation: 0,
            })),
        }
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> AsyncSnapshot<T, E> {
        self.tracker.borrow().snapshot.clone()
    }

    pub fn future(&self) -> Option<&UnitFuture<T, E>> {
        self.future.as_ref()
    }

    /// Follow `future` instead of the current one.
    ///
    /// Passing the same future again (by identity) changes nothing, unless
    /// an earlier spawn of it failed, in which case the subscription is
    /// retried.
    pub fn update(&mut self, future: Option<UnitFuture<T, E>>) -> LifecycleResult<()> {
        let same = match (&self.future, &future) {
            (Some(current), Some(next)) => {
                current.ptr_eq(next) && self.tracker.borrow().active.is_some()
            }
            (None, None) => true,
            _ => false,
        };
        if same {
            return Ok(());
        }

        if self.tracker.borrow().active.is_some() {
            self.unsubscribe();
            let mut tracker = self.tracker.borrow_mut();
            let snapshot = std::mem::replace(&mut tracker.snapshot, AsyncSnapshot::nothing());
            tracker.snapshot = snapshot.in_state(ConnectionState::None);
        }
        self.future = future;
        self.subscribe()
    }

    fn subscribe(&mut self) -> LifecycleResult<()> {
        let Some(future) = self.future.clone() else {
            return Ok(());
        };
        let host = self.base.expect_host().clone();

        let token = {
            let mut tracker = self.tracker.borrow_mut();
            tracker.generation += 1;
            tracker.generation
        };
        let weak = Rc::downgrade(&self.tracker);
        host.spawn_local(resolve(future, weak, host.clone(), token).boxed_local())?;

        let mut tracker = self.tracker.borrow_mut();
        tracker.active = Some(token);
        let snapshot = std::mem::replace(&mut tracker.snapshot, AsyncSnapshot::nothing());
        tracker.snapshot = snapshot.in_state(ConnectionState::Waiting);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.tracker.borrow_mut().active = None;
    }
}

async fn resolve<T, E, C>(
    future: UnitFuture<T, E>,
    tracker: Weak<RefCell<Tracker<T, E>>>,
    host: HostHandle<C>,
    token: u64,
) where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let result = future.await;

    let Some(tracker) = tracker.upgrade() else {
        return;
    };
    if tracker.borrow().active != Some(token) {
        return;
    }

    host.request_render(|| {
        tracker.borrow_mut().snapshot = match result {
            Ok(data) => AsyncSnapshot::with_data(ConnectionState::Done, data),
            Err(error) => AsyncSnapshot::with_error(ConnectionState::Done, error),
        };
    });
}

impl<T, E, C> BehaviorUnit<C> for FutureUnit<T, E, C>
where
    T: Clone + 'static,
    E: Clone + 'static,
    C: 'static,
{
    fn kind(&self) -> UnitKind {
        UnitKind::FUTURE
    }

    fn base(&self) -> &UnitBase<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut UnitBase<C> {
        &mut self.base
    }

    fn on_create(&mut self) -> UnitResult {
        Ok(self.subscribe()?)
    }

    fn on_dispose(&mut self) -> UnitResult {
        self.unsubscribe();
        Ok(())
    }
}
