//! Lazy Evaluator
//!
//! Brings one atom's state up to date with its dependencies.
//!
//! # How Resolution Works
//!
//! 1. A mounted atom that has been evaluated is returned as is. The
//!    propagator keeps mounted atoms fresh, so pulling is unnecessary.
//!
//! 2. An unmounted atom that has been evaluated is validated: every recorded
//!    dependency is resolved in turn and its epoch compared with the one
//!    recorded at the last evaluation. If all match, the cache is returned.
//!
//! 3. Otherwise the read function runs with a tracking getter and its
//!    result (value or error) is stored. The epoch only moves if the
//!    outcome actually changed.
//!
//! The propagator passes a `force` predicate to skip step 1 for atoms it is
//! about to revalidate, since their cached value may predate the write.

use smallvec::SmallVec;
use tracing::trace;

use crate::atom::{AtomId, AtomKey, ErasedAtom, Value};
use crate::error::{Result, StoreError};
use crate::graph::{Outcome, Snapshot};

use super::access::Getter;
use super::Store;

/// Atoms for which the mounted-cache shortcut must not be taken.
pub(crate) type Force<'a> = Option<&'a dyn Fn(AtomId) -> bool>;

impl Store {
    /// Return an up-to-date snapshot of `atom`, evaluating it if needed.
    ///
    /// Errors raised by the atom's read function are part of the snapshot.
    /// An `Err` is only returned for internal faults.
    pub(crate) fn resolve(&self, atom: &AtomKey, force: Force<'_>) -> Result<Snapshot> {
        let id = atom.id();
        let cached = {
            let states = self.inner.states.borrow();
            states
                .get(&id)
                .filter(|state| state.is_initialized())
                .map(|state| {
                    let dependencies: SmallVec<[(AtomKey, u64); 4]> = state
                        .dependencies
                        .iter()
                        .map(|(dependency, epoch)| (dependency.clone(), *epoch))
                        .collect();
                    (state.mounted.is_some(), dependencies)
                })
        };

        if let Some((mounted, dependencies)) = cached {
            let forced = force.is_some_and(|force| force(id));
            if mounted && !forced {
                return self.snapshot(id);
            }
            if self.dependencies_unchanged(atom, &dependencies, force)? {
                trace!(store = %self.name(), atom = %atom, "cached value still valid");
                return self.snapshot(id);
            }
        }

        self.evaluate(atom, force)
    }

    fn dependencies_unchanged(
        &self,
        atom: &AtomKey,
        dependencies: &[(AtomKey, u64)],
        force: Force<'_>,
    ) -> Result<bool> {
        for (dependency, epoch) in dependencies {
            if dependency == atom {
                continue;
            }
            if self.resolve(dependency, force)?.epoch != *epoch {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run the read function of `atom` and store its outcome.
    fn evaluate(&self, atom: &AtomKey, force: Force<'_>) -> Result<Snapshot> {
        let id = atom.id();
        self.inner
            .states
            .borrow_mut()
            .entry(id)
            .or_default()
            .dependencies
            .clear();

        let getter = Getter::tracking(self, atom.clone(), force);
        let result = atom.read(&getter);
        let dependencies = getter.into_dependencies();

        let mut states = self.inner.states.borrow_mut();
        let state = states.entry(id).or_default();
        state.dependencies = dependencies;
        let changed = match result {
            Ok(value) => state.store_value(atom, value),
            Err(error) => {
                state.store_error(error);
                true
            }
        };

        trace!(
            store = %self.name(),
            atom = %atom,
            epoch = state.epoch,
            changed,
            dependencies = state.dependencies.len(),
            "evaluated atom"
        );
        state.snapshot(id)
    }

    /// Self-read of `atom` from inside its own read or write.
    ///
    /// Seeds the state with the initial value if nothing is stored yet.
    /// Records no dependency.
    pub(crate) fn read_own(&self, atom: &dyn ErasedAtom) -> Result<Value> {
        let id = atom.id();
        if !atom.has_initial_value() {
            return Err(StoreError::InvalidSelfRead(id));
        }

        let mut states = self.inner.states.borrow_mut();
        let state = states.entry(id).or_default();
        if state.outcome.is_none() {
            state.outcome = atom.initial_value().map(Outcome::Value);
        }
        match &state.outcome {
            Some(outcome) => outcome.clone().into_value(),
            None => Err(StoreError::Uninitialized(id)),
        }
    }

    fn snapshot(&self, id: AtomId) -> Result<Snapshot> {
        match self.inner.states.borrow().get(&id) {
            Some(state) => state.snapshot(id),
            None => Err(StoreError::Uninitialized(id)),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
