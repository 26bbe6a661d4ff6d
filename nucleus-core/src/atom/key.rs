//! Type-erased atom handles.
//!
//! The store keeps atoms of many value types in one graph. [`AtomKey`] is
//! the type-erased handle it uses as node identity: it hashes and compares
//! by [`AtomId`] and can still evaluate the atom it points to.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use crate::error::Result;
use crate::store::Getter;

use super::id::AtomId;

/// A type-erased atom value as stored in the graph.
pub(crate) type Value = Rc<dyn Any>;

/// The part of an atom the store needs without knowing its value type.
pub(crate) trait ErasedAtom {
    fn id(&self) -> AtomId;

    fn label(&self) -> Option<&str>;

    fn has_initial_value(&self) -> bool;

    fn initial_value(&self) -> Option<Value>;

    /// Run the atom's read function, or the self-read for primitives.
    fn read(&self, getter: &Getter<'_>) -> Result<Value>;

    /// Compare two values of this atom's type.
    fn same_value(&self, previous: &Value, next: &Value) -> bool;
}

/// Graph identity of an atom.
#[derive(Clone)]
pub(crate) struct AtomKey(Rc<dyn ErasedAtom>);

impl AtomKey {
    pub(crate) fn new(atom: Rc<dyn ErasedAtom>) -> Self {
        Self(atom)
    }
}

impl Deref for AtomKey {
    type Target = dyn ErasedAtom;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for AtomKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for AtomKey {}

impl Hash for AtomKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.label() {
            Some(label) => write!(f, "{}:{}", self.0.id(), label),
            None => write!(f, "{}", self.0.id()),
        }
    }
}

impl fmt::Debug for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
