//! Propagator
//!
//! Pushes a write through the mounted subgraph and notifies listeners.
//!
//! # Recompute
//!
//! Starting from the written atom, mounted dependents are ordered so every
//! atom comes after everything it reads. They are then visited in that
//! order; an atom is only recomputed if one of its dependencies changed
//! epoch during this pass, so an intermediate that produced an equal value
//! stops the walk below it.
//!
//! Atoms still waiting to be visited are "marked". Reading a marked atom
//! bypasses the mounted-cache shortcut, which matters when a recompute
//! picks up a new dependency that sits further down the order.
//!
//! # Flush
//!
//! Every atom whose epoch changed is queued. The queue is drained once the
//! outermost write returns; writes made by listeners feed the same queue and
//! are drained by the same loop, so a flush never nests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;
use tracing::debug;

use crate::atom::{AtomId, AtomKey};
use crate::error::Result;
use crate::graph::topological_order;

use super::{Listener, ListenerId, Store};

/// Clears the flushing flag even if a listener panics.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Store {
    /// Recompute the mounted atoms downstream of `root`, which was just
    /// assigned a new value, and queue those that changed.
    pub(crate) fn recompute_dependents(&self, root: &AtomKey) -> Result<()> {
        let mut order = topological_order(root.clone(), |atom| self.mounted_dependents(atom));
        order.reverse();
        if order.len() <= 1 {
            return Ok(());
        }

        let marked: RefCell<HashSet<AtomId>> =
            RefCell::new(order.iter().skip(1).map(|atom| atom.id()).collect());
        let is_marked = |id: AtomId| marked.borrow().contains(&id);

        // An atom may be re-evaluated before its own turn when an earlier
        // atom starts reading it, so compare against epochs from before the
        // sweep.
        let before: HashMap<AtomId, u64> = order
            .iter()
            .map(|atom| (atom.id(), self.epoch_of(atom.id())))
            .collect();

        let mut changed: HashSet<AtomId> = HashSet::new();
        changed.insert(root.id());
        let mut recomputed = 0usize;

        for atom in order.iter().skip(1) {
            if self.has_changed_dependency(atom, &changed) {
                self.resolve(atom, Some(&is_marked))?;
                self.mount_dependencies(atom)?;
                recomputed += 1;
            }
            if before.get(&atom.id()) != Some(&self.epoch_of(atom.id())) {
                self.inner.pending.borrow_mut().insert(atom.clone());
                changed.insert(atom.id());
            }
            marked.borrow_mut().remove(&atom.id());
        }

        debug!(
            store = %self.name(),
            root = %root,
            visited = order.len() - 1,
            recomputed,
            changed = changed.len() - 1,
            "propagated write"
        );
        Ok(())
    }

    fn has_changed_dependency(&self, atom: &AtomKey, changed: &HashSet<AtomId>) -> bool {
        self.inner.states.borrow().get(&atom.id()).is_some_and(|state| {
            state
                .dependencies
                .keys()
                .any(|dependency| dependency != atom && changed.contains(&dependency.id()))
        })
    }

    /// Notify the listeners of every queued atom, until the queue stays empty.
    ///
    /// Returns immediately when a flush is already running further up the
    /// stack; that flush picks up whatever was queued.
    pub(crate) fn flush_pending(&self) {
        if self.inner.flushing.replace(true) {
            return;
        }
        let _guard = FlushGuard(&self.inner.flushing);

        let mut rounds = 0usize;
        let mut notified = 0usize;
        loop {
            let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
            if pending.is_empty() {
                break;
            }
            rounds += 1;

            for atom in pending {
                let listeners: SmallVec<[Listener; 2]> = self
                    .with_mounted(atom.id(), |mounted| {
                        mounted.listeners.values().cloned().collect()
                    })
                    .unwrap_or_default();

                for listener in listeners {
                    // An earlier listener may have unsubscribed this one.
                    if self.has_listener(&atom, listener.id()) {
                        listener.notify();
                        notified += 1;
                    }
                }
            }
        }

        if rounds > 0 {
            debug!(store = %self.name(), rounds, notified, "flushed listeners");
        }
    }

    fn has_listener(&self, atom: &AtomKey, listener: ListenerId) -> bool {
        self.with_mounted(atom.id(), |mounted| mounted.listeners.contains_key(&listener))
            .unwrap_or(false)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
