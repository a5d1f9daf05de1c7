//! # Change signals
//!
//! Single-threaded notification streams. A `Signal<T>` fans a value out to its
//! listeners in registration order; a `Subscription` removes its listener when
//! dropped.
//!
//! ## Invariants
//! - Listeners are called in registration order.
//! - A listener removed during an emission is not called for the rest of it.
//! - Emission holds no borrow while a listener runs, so listeners may
//!   subscribe, unsubscribe or emit again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct SignalInner<T> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
}

/// A change-notification stream
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// subscription is dropped or unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
                }
            })),
        }
    }

    /// Deliver a value to every current listener
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(id, l)| (*id, Rc::clone(l)))
            .collect();

        for (id, listener) in snapshot {
            let still_registered = self
                .inner
                .listeners
                .borrow()
                .iter()
                .any(|(i, _)| *i == id);
            if still_registered {
                listener(value);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// Handle to a registered listener; unsubscribes on drop
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listeners_called_in_order() {
        let signal = Signal::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s1 = {
            let seen = Rc::clone(&seen);
            signal.subscribe(move |v| seen.borrow_mut().push(("first", *v)))
        };
        let s2 = {
            let seen = Rc::clone(&seen);
            signal.subscribe(move |v| seen.borrow_mut().push(("second", *v)))
        };

        signal.emit(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
        drop((s1, s2));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let signal = Signal::<u32>::new();
        let count = Rc::new(Cell::new(0));

        let sub = {
            let count = Rc::clone(&count);
            signal.subscribe(move |_| count.set(count.get() + 1))
        };
        signal.emit(&1);
        drop(sub);
        signal.emit(&2);

        assert_eq!(count.get(), 1);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_emission_skips_listener() {
        let signal = Signal::<u32>::new();
        let later_calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let _first = {
            let slot = Rc::clone(&slot);
            signal.subscribe(move |_| {
                slot.borrow_mut().take();
            })
        };
        let second = {
            let later_calls = Rc::clone(&later_calls);
            signal.subscribe(move |_| later_calls.set(later_calls.get() + 1))
        };
        *slot.borrow_mut() = Some(second);

        signal.emit(&1);
        assert_eq!(later_calls.get(), 0);
    }

    #[test]
    fn test_subscription_outlives_signal() {
        let signal = Signal::<u32>::new();
        let sub = signal.subscribe(|_| {});
        drop(signal);
        sub.unsubscribe();
    }
}
