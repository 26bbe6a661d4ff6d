//! Atoms
//!
//! Atoms are the descriptors a [`Store`](crate::Store) operates on. This
//! module only builds them; all runtime behaviour lives in the store.

mod descriptor;
mod id;
mod key;

pub use descriptor::{Atom, AtomKind, AtomValue, ReadFn, WriteFn};
pub use id::AtomId;

pub(crate) use descriptor::Write;
pub(crate) use key::{AtomKey, ErasedAtom, Value};
