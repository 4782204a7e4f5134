//! Stream-backed unit.
//!
//! Same generation discipline as [`FutureUnit`](super::FutureUnit), over a
//! stream of results: every item re-renders the owner with an `Active`
//! snapshot, the end of the stream moves it to `Done` with the last item.
//! Unsubscribing also aborts the pumping task, which drops the stream.

use crate::unit::future::{AsyncSnapshot, ConnectionState};
use crate::unit::{BehaviorUnit, UnitBase, UnitResult};
use crate::{HostHandle, LifecycleResult, UnitKind};
use futures::future::{AbortHandle, Abortable};
use futures::stream::{LocalBoxStream, Stream, StreamExt};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Boxed local stream a [`StreamUnit`] can follow
pub type UnitStream<T, E> = LocalBoxStream<'static, Result<T, E>>;

struct Tracker<T, E> {
    snapshot: AsyncSnapshot<T, E>,
    active: Option<u64>,
    generation: u64,
}

impl<T, E> Tracker<T, E> {
    fn is_active(&self, token: u64) -> bool {
        self.active == Some(token)
    }
}

/// Follows one stream and re-renders the owner on every item
pub struct StreamUnit<T, E, C = ()> {
    base: UnitBase<C>,
    stream: Option<UnitStream<T, E>>,
    abort: Option<AbortHandle>,
    tracker: Rc<RefCell<Tracker<T, E>>>,
}

impl<T, E, C> StreamUnit<T, E, C>
where
    T: Clone + 'static,
    E: Clone + 'static,
    C: 'static,
{
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + 'static,
    {
        Self {
            base: UnitBase::new(),
            stream: Some(stream.boxed_local()),
            abort: None,
            tracker: Rc::new(RefCell::new(Tracker {
                snapshot: AsyncSnapshot::nothing(),
                active: None,
                generation: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> AsyncSnapshot<T, E> {
        self.tracker.borrow().snapshot.clone()
    }

    /// Drop the current subscription and follow `stream` instead.
    ///
    /// The last data or error is kept, in state `None`, until the new stream
    /// produces something.
    pub fn update<S>(&mut self, stream: S) -> LifecycleResult<()>
    where
        S: Stream<Item = Result<T, E>> + 'static,
    {
        if self.tracker.borrow().active.is_some() {
            self.unsubscribe();
            let mut tracker = self.tracker.borrow_mut();
            let snapshot = std::mem::replace(&mut tracker.snapshot, AsyncSnapshot::nothing());
            tracker.snapshot = snapshot.in_state(ConnectionState::None);
        }
        self.stream = Some(stream.boxed_local());
        self.subscribe()
    }

    fn subscribe(&mut self) -> LifecycleResult<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let host = self.base.expect_host().clone();

        let token = {
            let mut tracker = self.tracker.borrow_mut();
            tracker.generation += 1;
            tracker.generation
        };
        let (abort, registration) = AbortHandle::new_pair();
        let pump = pump(stream, Rc::downgrade(&self.tracker), host.clone(), token);
        host.spawn_local(Box::pin(async move {
            let _ = Abortable::new(pump, registration).await;
        }))?;

        self.abort = Some(abort);
        let mut tracker = self.tracker.borrow_mut();
        tracker.active = Some(token);
        let snapshot = std::mem::replace(&mut tracker.snapshot, AsyncSnapshot::nothing());
        tracker.snapshot = snapshot.in_state(ConnectionState::Waiting);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.tracker.borrow_mut().active = None;
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

async fn pump<T, E, C>(
    mut stream: UnitStream<T, E>,
    tracker: Weak<RefCell<Tracker<T, E>>>,
    host: HostHandle<C>,
    token: u64,
) where
    T: Clone + 'static,
    E: Clone + 'static,
{
    while let Some(item) = stream.next().await {
        let Some(tracker) = tracker.upgrade() else {
            return;
        };
        if !tracker.borrow().is_active(token) {
            return;
        }
        host.request_render(|| {
            tracker.borrow_mut().snapshot = match item {
                Ok(data) => AsyncSnapshot::with_data(ConnectionState::Active, data),
                Err(error) => AsyncSnapshot::with_error(ConnectionState::Active, error),
            };
        });
    }

    let Some(tracker) = tracker.upgrade() else {
        return;
    };
    let finished = {
        let tracker = tracker.borrow();
        tracker.is_active(token) && (tracker.snapshot.has_data() || tracker.snapshot.has_error())
    };
    if finished {
        host.request_render(|| {
            let mut tracker = tracker.borrow_mut();
            let snapshot = std::mem::replace(&mut tracker.snapshot, AsyncSnapshot::nothing());
            tracker.snapshot = snapshot.in_state(ConnectionState::Done);
        });
    }
}

impl<T, E, C> BehaviorUnit<C> for StreamUnit<T, E, C>
where
    T: Clone + 'static,
    E: Clone + 'static,
    C: 'static,
{
    fn kind(&self) -> UnitKind {
        UnitKind::STREAM
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
