//! Subscription handles.

use std::fmt;

use crate::atom::{AtomId, AtomKey};

use super::{ListenerId, Store};

/// A registered listener.
///
/// Dropping the subscription removes the listener and unmounts whatever
/// only it kept mounted. Call [`Subscription::detach`] to keep the listener
/// for the lifetime of the store instead.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    store: Store,
    atom: AtomKey,
    listener: ListenerId,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(store: Store, atom: AtomKey, listener: ListenerId) -> Self {
        Self {
            store,
            atom,
            listener,
            active: true,
        }
    }

    /// The atom this subscription observes.
    pub fn atom_id(&self) -> AtomId {
        self.atom.id()
    }

    /// The ID of the registered listener, unique across all stores.
    pub fn listener_id(&self) -> ListenerId {
        self.listener
    }

    /// Remove the listener now. Same as dropping the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered without holding on to the handle.
    pub fn detach(mut self) {
        self.active = false;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            self.store.unsubscribe(&self.atom, self.listener);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("atom", &self.atom)
            .field("listener", &self.listener)
            .field("active", &self.active)
            .finish()
    }
}
