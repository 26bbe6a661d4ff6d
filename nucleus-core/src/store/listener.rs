//! Listener types for store subscriptions.
//!
//! A listener is a zero-argument callback registered on one atom. The store
//! only stores, invokes and removes it.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a listener.
///
/// Closures have no identity of their own, so each registration gets an ID
/// that the matching [`Subscription`](super::Subscription) uses to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A registered change callback.
#[derive(Clone)]
pub(crate) struct Listener {
    id: ListenerId,
    notify: Rc<dyn Fn()>,
}

impl Listener {
    /// Wrap a callback under a fresh ID.
    pub(crate) fn new<F>(notify: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            id: ListenerId::new(),
            notify: Rc::new(notify),
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback.
    pub(crate) fn notify(&self) {
        (self.notify)();
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}
