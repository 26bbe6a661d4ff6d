//! Write path.

use std::rc::Rc;

use tracing::trace;

use crate::atom::{Atom, AtomKey, AtomValue, Value, Write};
use crate::error::{Result, StoreError};

use super::access::{Getter, Setter};
use super::Store;

impl Store {
    /// Run the write function of `atom` without flushing listeners.
    ///
    /// Nested writes issued through the setter end up here as well, so a
    /// whole chain of writes shares one pending queue.
    pub(crate) fn write_atom<T, A>(&self, atom: &Atom<T, A>, args: A) -> Result<()>
    where
        T: AtomValue,
        A: 'static,
    {
        let setter = Setter::new(self, atom.key());
        match atom.write_fn() {
            Some(Write::Assign) => setter.set(atom, args),
            Some(Write::Custom(write)) => {
                let write = Rc::clone(write);
                write(&Getter::plain(self), &setter, args)
            }
            None => Err(StoreError::ReadOnly(atom.id())),
        }
    }

    /// Assign `value` to `atom` and recompute whatever it affects.
    pub(crate) fn assign(&self, atom: &AtomKey, value: Value) -> Result<()> {
        let (changed, epoch) = {
            let mut states = self.inner.states.borrow_mut();
            let state = states.entry(atom.id()).or_default();
            (state.store_value(atom, value), state.epoch)
        };
        trace!(store = %self.name(), atom = %atom, epoch, changed, "assigned atom");

        self.mount_dependencies(atom)?;
        if changed {
            self.inner.pending.borrow_mut().insert(atom.clone());
            self.recompute_dependents(atom)?;
        }
        Ok(())
    }
}
