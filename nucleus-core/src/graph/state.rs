//! Atom State Records
//!
//! The mutable runtime state a store attaches to one atom.

use indexmap::{IndexMap, IndexSet};

use crate::atom::{AtomId, AtomKey, Value};
use crate::error::{Result, StoreError};
use crate::store::{Listener, ListenerId};

/// The result of the last evaluation or assignment of an atom.
#[derive(Clone)]
pub(crate) enum Outcome {
    Value(Value),
    Error(StoreError),
}

impl Outcome {
    pub(crate) fn into_value(self) -> Result<Value> {
        match self {
            Outcome::Value(value) => Ok(value),
            Outcome::Error(error) => Err(error),
        }
    }
}

/// A settled view of an atom state, detached from the state map.
#[derive(Clone)]
pub(crate) struct Snapshot {
    pub(crate) epoch: u64,
    pub(crate) outcome: Outcome,
}

/// Runtime state of one atom in one store.
#[derive(Default)]
pub(crate) struct AtomState {
    /// Atoms read during the last evaluation, with the epoch each had then.
    pub(crate) dependencies: IndexMap<AtomKey, u64>,

    /// Bumped whenever the stored value or error changes.
    pub(crate) epoch: u64,

    /// `None` until the atom has been evaluated or assigned.
    pub(crate) outcome: Option<Outcome>,

    /// Present while the atom is part of the observed subgraph.
    pub(crate) mounted: Option<Mounted>,
}

impl AtomState {
    pub(crate) fn is_initialized(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn snapshot(&self, id: AtomId) -> Result<Snapshot> {
        match &self.outcome {
            Some(outcome) => Ok(Snapshot {
                epoch: self.epoch,
                outcome: outcome.clone(),
            }),
            None => Err(StoreError::Uninitialized(id)),
        }
    }

    /// Store a value, bumping the epoch unless it equals the previous one.
    ///
    /// Returns whether the epoch changed.
    pub(crate) fn store_value(&mut self, atom: &AtomKey, value: Value) -> bool {
        if let Some(Outcome::Value(previous)) = &self.outcome {
            if atom.same_value(previous, &value) {
                return false;
            }
        }
        self.outcome = Some(Outcome::Value(value));
        self.epoch += 1;
        true
    }

    /// Store an error. Errors always count as a change.
    pub(crate) fn store_error(&mut self, error: StoreError) {
        self.outcome = Some(Outcome::Error(error));
        self.epoch += 1;
    }
}

/// Mount record of an atom that is observed, directly or transitively.
#[derive(Default)]
pub(crate) struct Mounted {
    /// Callbacks registered through `subscribe`.
    pub(crate) listeners: IndexMap<ListenerId, Listener>,

    /// Mirror of the dependency edges at the last mount or re-sync.
    pub(crate) dependencies: IndexSet<AtomKey>,

    /// Mounted atoms that read this atom.
    pub(crate) dependents: IndexSet<AtomKey>,
}

impl Mounted {
    pub(crate) fn new(dependencies: IndexSet<AtomKey>) -> Self {
        Self {
            dependencies,
            ..Self::default()
        }
    }

    /// Whether a subscriber is registered directly on this atom.
    pub(crate) fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }
}
