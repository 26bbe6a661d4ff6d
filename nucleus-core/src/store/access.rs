//! Getter and Setter
//!
//! Read and write functions never touch the store directly. They receive a
//! [`Getter`] and, for writes, a [`Setter`], which route every access
//! through the store so it can be tracked.
//!
//! # Tracking
//!
//! The getter handed to a read function records each atom it returns,
//! together with that atom's epoch. The recorded set replaces the atom's
//! dependencies once the read function returns, so dependencies that are
//! only read conditionally come and go with the branches actually taken.
//!
//! The getter handed to a write function does not record anything: writes
//! never become dependencies of another atom.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::atom::{Atom, AtomId, AtomKey, AtomValue, ErasedAtom, Value};
use crate::error::{Result, StoreError};

use super::evaluate::Force;
use super::Store;

struct Tracking<'s> {
    /// The atom whose read function is running.
    atom: AtomKey,
    force: Force<'s>,
    dependencies: RefCell<IndexMap<AtomKey, u64>>,
}

/// Read access to other atoms from inside a read or write function.
pub struct Getter<'s> {
    store: &'s Store,
    tracking: Option<Tracking<'s>>,
}

impl<'s> Getter<'s> {
    /// A getter that records dependencies of `atom`.
    pub(crate) fn tracking(store: &'s Store, atom: AtomKey, force: Force<'s>) -> Self {
        Self {
            store,
            tracking: Some(Tracking {
                atom,
                force,
                dependencies: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// A getter that reads without recording anything.
    pub(crate) fn plain(store: &'s Store) -> Self {
        Self {
            store,
            tracking: None,
        }
    }

    /// Read the current value of `atom`.
    ///
    /// Inside a read function this makes `atom` a dependency. Reading the
    /// atom whose read function is running returns its stored value (or its
    /// initial value if nothing is stored yet) and fails with
    /// [`StoreError::InvalidSelfRead`] if it has no initial value.
    pub fn get<T, A>(&self, atom: &Atom<T, A>) -> Result<T>
    where
        T: AtomValue,
        A: 'static,
    {
        let key = atom.key();
        let value = match &self.tracking {
            Some(tracking) if tracking.atom == key => self.store.read_own(&*key)?,
            Some(tracking) => {
                let snapshot = self.store.resolve(&key, tracking.force)?;
                tracking
                    .dependencies
                    .borrow_mut()
                    .insert(key, snapshot.epoch);
                snapshot.outcome.into_value()?
            }
            None => self.store.resolve(&key, None)?.outcome.into_value()?,
        };
        downcast(&value, atom.id())
    }

    /// Self-read on behalf of an atom without a read function.
    pub(crate) fn read_own(&self, atom: &dyn ErasedAtom) -> Result<Value> {
        self.store.read_own(atom)
    }

    /// Take the dependencies recorded so far.
    pub(crate) fn into_dependencies(self) -> IndexMap<AtomKey, u64> {
        self.tracking
            .map(|tracking| tracking.dependencies.into_inner())
            .unwrap_or_default()
    }
}

/// Write access from inside a write function.
///
/// A setter is bound to the atom whose write function received it.
pub struct Setter<'s> {
    store: &'s Store,
    atom: AtomKey,
}

impl<'s> Setter<'s> {
    pub(crate) fn new(store: &'s Store, atom: AtomKey) -> Self {
        Self { store, atom }
    }

    /// Write to `target` as part of the current write.
    ///
    /// If `target` is the atom this setter belongs to, `args` is assigned as
    /// its value (see [`Setter::assign`]). Any other atom has its own write
    /// function run with `args`. Listeners are only notified once the
    /// outermost `set` returns.
    pub fn set<T, A>(&self, target: &Atom<T, A>, args: A) -> Result<()>
    where
        T: AtomValue,
        A: 'static,
    {
        if target.id() != self.atom.id() {
            return self.store.write_atom(target, args);
        }
        if !target.has_initial_value() {
            return Err(StoreError::NotWritable(target.id()));
        }

        let args: Box<dyn Any> = Box::new(args);
        let value = args
            .downcast::<T>()
            .map_err(|_| StoreError::ValueType(target.id()))?;
        self.assign(target, *value)
    }

    /// Assign `value` directly to the atom this setter belongs to.
    ///
    /// Unlike [`Setter::set`] this takes a value rather than write
    /// arguments, which is what a reducer-style write function needs. Only
    /// the atom being written can be assigned, and only if it has an initial
    /// value; anything else fails with [`StoreError::NotWritable`].
    pub fn assign<T, A>(&self, target: &Atom<T, A>, value: T) -> Result<()>
    where
        T: AtomValue,
        A: 'static,
    {
        if target.id() != self.atom.id() || !target.has_initial_value() {
            return Err(StoreError::NotWritable(target.id()));
        }
        self.store.assign(&target.key(), Rc::new(value) as Value)
    }
}

fn downcast<T: AtomValue>(value: &Value, atom: AtomId) -> Result<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or(StoreError::ValueType(atom))
}
