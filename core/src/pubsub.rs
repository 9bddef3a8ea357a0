//! A small observer/subscriber primitive shared by every state machine and
//! the manager.
//!
//! Rather than pull in a third-party signals crate for what is, in the end,
//! an ordered list of callbacks invoked synchronously on the calling
//! thread, this module builds the shape directly out of
//! `std::sync::{Arc, Mutex}` — the same primitives the rest of this
//! workspace already uses to guard shared mutable state across threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Callback<T> = Box<dyn Fn(T) + Send + 'static>;

struct Inner<T> {
    subscribers: Vec<(u64, Callback<T>)>,
}

/// An ordered collection of subscriber callbacks for events of type `T`.
///
/// Callbacks are invoked synchronously, in registration order, on whichever
/// thread calls [`Subscribers::notify`]. Cloning a `Subscribers<T>` shares
/// the same underlying subscriber list.
pub struct Subscribers<T> {
    inner: Arc<Mutex<Inner<T>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                subscribers: Vec::new(),
            })),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T: Clone> Subscribers<T> {
    /// Create an empty subscriber list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. The returned [`Subscription`] unregisters the
    /// callback when dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(T) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.push((id, Box::new(callback)));
        }
        Subscription {
            id,
            unregister: Box::new({
                let inner = Arc::clone(&self.inner);
                move |id| {
                    if let Ok(mut inner) = inner.lock() {
                        inner.subscribers.retain(|(existing, _)| *existing != id);
                    }
                }
            }),
        }
    }

    /// Invoke every subscriber, in registration order, with a clone of
    /// `value`.
    pub fn notify(&self, value: T) {
        let Ok(inner) = self.inner.lock() else {
            return;
        };
        for (_, callback) in &inner.subscribers {
            callback(value.clone());
        }
    }
}

/// An active subscription. Dropping this unregisters the associated
/// callback; the callback will not fire again after this point.
pub struct Subscription {
    id: u64,
    unregister: Box<dyn FnMut(u64) + Send>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        (self.unregister)(self.id);
    }
}
