//! Store Errors
//!
//! Every fallible store operation returns a [`StoreError`]. Errors produced
//! while evaluating an atom are cached in that atom's state and re-raised to
//! every reader, so the type is cheap to clone.

use std::sync::Arc;

use thiserror::Error;

use crate::atom::AtomId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors raised by a [`Store`](crate::Store).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// An atom read itself but has no initial value to fall back on.
    #[error("atom {0} reads itself but has no initial value")]
    InvalidSelfRead(AtomId),

    /// A value was assigned directly to an atom without an initial value.
    #[error("atom {0} cannot be assigned directly: it has no initial value")]
    NotWritable(AtomId),

    /// `set` was called on an atom that has no write function.
    #[error("atom {0} is read-only")]
    ReadOnly(AtomId),

    /// An atom state was read before any value or error was stored.
    ///
    /// The evaluator always initializes a state before handing it out, so
    /// seeing this is a bug in the store.
    #[error("atom {0} was accessed before it was initialized")]
    Uninitialized(AtomId),

    /// A stored or assigned value did not have the atom's value type.
    #[error("atom {0} holds a value of an unexpected type")]
    ValueType(AtomId),

    /// A user-supplied read function failed.
    #[error("reading atom {atom} failed: {source}")]
    Read {
        atom: AtomId,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap an arbitrary error raised inside the read function of `atom`.
    pub fn read_failed<E>(atom: AtomId, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Read {
            atom,
            source: Arc::new(error),
        }
    }

    /// The atom this error was raised for.
    pub fn atom(&self) -> AtomId {
        match self {
            Self::InvalidSelfRead(atom)
            | Self::NotWritable(atom)
            | Self::ReadOnly(atom)
            | Self::Uninitialized(atom)
            | Self::ValueType(atom) => *atom,
            Self::Read { atom, .. } => *atom,
        }
    }
}
