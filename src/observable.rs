//! # Observable values
//!
//! [`Observable<T>`] is a shared, version-tracked value with change
//! listeners. [`Subscription`] is an RAII guard: dropping it removes the
//! listener.
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Listeners are stored as `Weak` pointers and pruned lazily during
//! notification.
//!
//! ## Invariants
//!
//! 1. Version increments exactly once per mutation.
//! 2. Listeners are notified synchronously, in registration order, before the
//!    mutating call returns.
//! 3. [`Observable::set`] with a value equal to the current one is not a
//!    mutation: no version bump, no notification.
//! 4. No borrow is held while a listener runs, so listeners may read or
//!    mutate the observable again.
//! 5. A disposed observable has no listeners; mutating or subscribing to it panics.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct Listener<T>(Box<dyn Fn(&T)>);

struct ObservableInner<T> {
    value: T,
    version: u64,
    listeners: Vec<Weak<Listener<T>>>,
    disposed: bool,
}

/// Shared value wrapper that notifies listeners on change.
///
/// Cloning an `Observable` creates another handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                listeners: Vec::new(),
                disposed: false,
            })),
        }
    }

    /// Clone of the current value
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value without cloning
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying listeners if it changed
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        {
            let inner = self.inner.borrow();
            assert!(!inner.disposed, "Observable::set called after dispose");
            if inner.value == value {
                return;
            }
        }
        self.update(move |current| *current = value);
    }

    /// Mutate the value in place. Always counts as a mutation.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (snapshot, listeners) = {
            let mut inner = self.inner.borrow_mut();
            assert!(!inner.disposed, "Observable::update called after dispose");
            f(&mut inner.value);
            inner.version += 1;
            inner.listeners.retain(|weak| weak.strong_count() > 0);
            let listeners: Vec<Rc<Listener<T>>> =
                inner.listeners.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), listeners)
        };

        for listener in listeners {
            (listener.0)(&snapshot);
        }
    }

    /// Register a listener; it stays registered while the guard lives.
    ///
    /// # Panics
    ///
    /// Panics if the observable was disposed.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let listener = Rc::new(Listener(Box::new(listener)));
        let mut inner = self.inner.borrow_mut();
        assert!(!inner.disposed, "Observable::subscribe called after dispose");
        inner.listeners.push(Rc::downgrade(&listener));
        Subscription {
            _listener: listener,
        }
    }

    /// Number of mutations so far
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Live listeners
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Drop every listener and refuse further mutation
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.clear();
        inner.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
pub struct Subscription {
    _listener: Rc<dyn Any>,
}

impl Subscription {
    /// Explicit form of dropping the guard
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_set_notifies_once_per_change() {
        let observable = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = observable.subscribe(move |v| sink.borrow_mut().push(*v));

        observable.set(1);
        observable.set(1);
        observable.set(2);

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(observable.version(), 2);
    }

    #[test]
    fn test_update_always_notifies() {
        let observable = Observable::new(vec![1]);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = observable.subscribe(move |_| counter.set(counter.get() + 1));

        observable.update(|v| v.push(2));
        observable.update(|_| {});

        assert_eq!(hits.get(), 2);
        assert_eq!(observable.get(), vec![1, 2]);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let observable = Observable::new(0);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = observable.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(observable.listener_count(), 1);

        sub.unsubscribe();
        observable.set(5);

        assert_eq!(hits.get(), 0);
        assert_eq!(observable.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_read_during_notification() {
        let observable = Observable::new(1);
        let reader = observable.clone();
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let _sub = observable.subscribe(move |_| sink.set(reader.get() * 10));

        observable.set(3);
        assert_eq!(seen.get(), 30);
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn test_set_after_dispose_panics() {
        let observable = Observable::new(0);
        observable.dispose();
        observable.set(1);
    }

    #[test]
    #[should_panic(expected = "subscribe called after dispose")]
    fn test_subscribe_after_dispose_panics() {
        let observable = Observable::new(0);
        observable.dispose();
        let _sub = observable.subscribe(|_| {});
    }
}
