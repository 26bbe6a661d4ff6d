//! Atom Store
//!
//! The store holds the runtime state of every atom it has seen and is the
//! only place atoms are read, written and observed.
//!
//! # How It Works
//!
//! 1. `get` resolves an atom lazily. Derived atoms are evaluated on first
//!    access and cached; the cache is trusted as long as every atom read
//!    during the last evaluation still has the epoch it had then.
//!
//! 2. `subscribe` mounts an atom and, transitively, everything it reads.
//!    Mounted atoms know their dependents, which unmounted atoms do not.
//!
//! 3. `set` runs the atom's write function. Each assignment that changes a
//!    value walks the mounted dependents in topological order, recomputes
//!    the ones whose inputs changed and queues those whose own value
//!    changed. When the outermost write returns, the queue is flushed and
//!    every listener of a changed atom runs once.
//!
//! Unmounted atoms are never recomputed eagerly, so the cost of a write is
//! proportional to what is observed rather than to the size of the graph.
//!
//! # Threading
//!
//! A store is single-threaded (`!Send`). Read functions, write functions and
//! listeners may call back into the store; no internal borrow is held while
//! user code runs.

mod access;
mod evaluate;
mod listener;
mod mount;
mod propagate;
mod subscription;
mod write;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::atom::{Atom, AtomId, AtomKey, AtomValue};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::graph::{AtomState, Mounted};

pub use access::{Getter, Setter};
pub use listener::ListenerId;
pub use subscription::Subscription;

pub(crate) use listener::Listener;

thread_local! {
    static DEFAULT_STORE: Store = Store::with_config(StoreConfig::named("default"));
}

/// The store shared by everything on the current thread.
///
/// Useful when a program only ever needs one store. Each thread gets its own.
pub fn default_store() -> Store {
    DEFAULT_STORE.with(Store::clone)
}

struct StoreInner {
    config: StoreConfig,

    /// Per-atom state, created on first access and kept for the store's
    /// lifetime.
    states: RefCell<HashMap<AtomId, AtomState>>,

    /// Mounted atoms whose epoch changed and whose listeners have not run.
    pending: RefCell<IndexSet<AtomKey>>,

    /// Set while `flush_pending` drains the queue.
    flushing: Cell<bool>,
}

/// A container for atom values.
///
/// Cloning a store is cheap; clones share the same state.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                config,
                states: RefCell::new(HashMap::new()),
                pending: RefCell::new(IndexSet::new()),
                flushing: Cell::new(false),
            }),
        }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Read the current value of an atom.
    ///
    /// Evaluates the atom if needed. If the atom's read function failed, the
    /// stored error is returned until the atom changes.
    pub fn get<T, A>(&self, atom: &Atom<T, A>) -> Result<T>
    where
        T: AtomValue,
        A: 'static,
    {
        Getter::plain(self).get(atom)
    }

    /// Write to an atom.
    ///
    /// Runs the atom's write function with `args`, recomputes every mounted
    /// atom affected by the write and notifies their listeners before
    /// returning. Writes made by those listeners are flushed by the same
    /// call.
    pub fn set<T, A>(&self, atom: &Atom<T, A>, args: A) -> Result<()>
    where
        T: AtomValue,
        A: 'static,
    {
        let result = self.write_atom(atom, args);
        self.flush_pending();
        result
    }

    /// Replace a primitive atom's value with `f` applied to the current one.
    pub fn update<T, F>(&self, atom: &Atom<T>, f: F) -> Result<()>
    where
        T: AtomValue,
        F: FnOnce(&T) -> T,
    {
        let current = self.get(atom)?;
        self.set(atom, f(&current))
    }

    /// Call `listener` whenever the atom's value changes.
    ///
    /// The listener is not called during `subscribe`. It stays registered
    /// until the returned [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<T, A, F>(&self, atom: &Atom<T, A>, listener: F) -> Result<Subscription>
    where
        T: AtomValue,
        A: 'static,
        F: Fn() + 'static,
    {
        let key = atom.key();
        self.mount(&key)?;

        let listener = Listener::new(listener);
        let id = listener.id();
        self.with_mounted(key.id(), |mounted| mounted.listeners.insert(id, listener));

        Ok(Subscription::new(self.clone(), key, id))
    }

    /// Whether the atom is currently part of the observed subgraph.
    pub fn is_mounted<T, A>(&self, atom: &Atom<T, A>) -> bool
    where
        T: AtomValue,
        A: 'static,
    {
        self.is_mounted_id(atom.id())
    }

    /// Number of atoms currently mounted.
    pub fn mounted_count(&self) -> usize {
        self.inner
            .states
            .borrow()
            .values()
            .filter(|state| state.mounted.is_some())
            .count()
    }

    pub(crate) fn unsubscribe(&self, atom: &AtomKey, listener: ListenerId) {
        self.with_mounted(atom.id(), |mounted| mounted.listeners.shift_remove(&listener));
        self.unmount(atom);
    }

    pub(crate) fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn is_mounted_id(&self, id: AtomId) -> bool {
        self.inner
            .states
            .borrow()
            .get(&id)
            .is_some_and(|state| state.mounted.is_some())
    }

    /// Run `f` on the mount record of `id`, if the atom is mounted.
    fn with_mounted<R>(&self, id: AtomId, f: impl FnOnce(&mut Mounted) -> R) -> Option<R> {
        let mut states = self.inner.states.borrow_mut();
        states.get_mut(&id).and_then(|state| state.mounted.as_mut()).map(f)
    }

    fn epoch_of(&self, id: AtomId) -> u64 {
        self.inner
            .states
            .borrow()
            .get(&id)
            .map_or(0, |state| state.epoch)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name())
            .field("atoms", &self.inner.states.borrow().len())
            .field("mounted", &self.mounted_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
