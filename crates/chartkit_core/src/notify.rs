//! Change notification
//!
//! Observers register a callback with a [`Notifier`] and receive a
//! [`Subscription`] guard. Delivery is synchronous and follows registration
//! order. Callbacks may freely subscribe, unsubscribe or trigger further
//! notifications: the observer list is snapshotted before delivery, so a
//! cascade never observes a half-updated list.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Identifier of one registered observer.
    pub struct ObserverId;
}

type Callback<T> = Rc<dyn Fn(&T)>;

struct Observers<T: 'static> {
    callbacks: SlotMap<ObserverId, Callback<T>>,
    /// Registration order; slot order is not stable across removals.
    order: Vec<ObserverId>,
}

impl<T: 'static> Observers<T> {
    /// Unlink an observer. The callback is handed back so the caller can drop
    /// it once the list is no longer borrowed.
    fn remove(&mut self, id: ObserverId) -> Option<Callback<T>> {
        let callback = self.callbacks.remove(id)?;
        self.order.retain(|o| *o != id);
        Some(callback)
    }
}

/// A list of observers interested in one kind of change.
pub struct Notifier<T: 'static = ()> {
    inner: Rc<RefCell<Observers<T>>>,
}

impl<T: 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Observers {
                callbacks: SlotMap::with_key(),
                order: Vec::new(),
            })),
        }
    }

    /// Register an observer. It stays registered until the returned guard drops.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut observers = self.inner.borrow_mut();
            let id = observers.callbacks.insert(Rc::new(callback));
            observers.order.push(id);
            id
        };
        let weak: Weak<RefCell<Observers<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    // Captured state (possibly other guards) drops after the borrow ends.
                    let removed = inner.borrow_mut().remove(id);
                    drop(removed);
                }
            })),
        }
    }

    /// Deliver `payload` to every observer registered at the time of the call.
    pub fn notify(&self, payload: &T) {
        let snapshot: SmallVec<[(ObserverId, Callback<T>); 4]> = {
            let observers = self.inner.borrow();
            observers
                .order
                .iter()
                .filter_map(|id| observers.callbacks.get(*id).map(|cb| (*id, cb.clone())))
                .collect()
        };
        for (id, callback) in snapshot {
            // Skip observers removed by an earlier callback in this round.
            if self.inner.borrow().callbacks.contains_key(id) {
                callback(payload);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier<()> {
    pub fn emit(&self) {
        self.notify(&());
    }
}

impl<T: 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.len())
            .finish()
    }
}

/// Guard for a registered observer; unregisters on drop.
#[must_use = "dropping a Subscription unregisters the observer immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A guard that is not attached to any notifier.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Keep the observer registered for as long as the notifier lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
