//! Atom Descriptors
//!
//! An atom is an immutable description of one piece of reactive state. It
//! holds no value itself: the value lives in whichever [`Store`] the atom is
//! used with, keyed by the atom's identity.
//!
//! # Shapes
//!
//! Every atom is the same struct with optional parts, and the store
//! dispatches on which parts are present:
//!
//! - **Primitive**: an initial value and no read function. Its value comes
//!   from the initial value and from writes.
//! - **Derived**: a read function and no write function. Its value is
//!   computed from other atoms.
//! - **Writable**: a read function and a write function. Writing runs the
//!   write function, which usually sets other atoms.
//!
//! A primitive may also carry a custom write function ([`Atom::with_write`]),
//! in which case assigning its own value happens through that function.
//!
//! [`Store`]: crate::Store

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::Result;
use crate::store::{Getter, Setter};

use super::id::AtomId;
use super::key::{AtomKey, ErasedAtom, Value};

/// Values an atom can hold.
///
/// Change detection compares the previous and next value with `==`, so a
/// write of an equal value is not a change.
pub trait AtomValue: Clone + PartialEq + 'static {}

impl<T> AtomValue for T where T: Clone + PartialEq + 'static {}

/// Computes a derived atom's value from other atoms.
pub type ReadFn<T> = Rc<dyn Fn(&Getter<'_>) -> Result<T>>;

/// Handles a write to an atom.
pub type WriteFn<A> = Rc<dyn Fn(&Getter<'_>, &Setter<'_>, A) -> Result<()>>;

/// The shape of an atom, derived from which parts it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// No read function. The value is set directly.
    Primitive,

    /// A read function and no write function.
    Derived,

    /// A read function and a write function.
    Writable,
}

pub(crate) enum Write<A> {
    /// Assign the written value to the atom itself.
    Assign,
    Custom(WriteFn<A>),
}

pub(crate) struct AtomInner<T, A> {
    id: AtomId,
    label: OnceCell<String>,
    initial: Option<T>,
    read: Option<ReadFn<T>>,
    write: Option<Write<A>>,
}

/// A reactive atom holding values of type `T`, written with arguments of
/// type `A`.
///
/// Cloning an atom is cheap and the clone refers to the same state in every
/// store.
pub struct Atom<T, A = T> {
    inner: Rc<AtomInner<T, A>>,
}

impl<T: AtomValue> Atom<T> {
    /// Create a primitive atom with the given initial value.
    ///
    /// Writing the atom assigns the written value.
    pub fn new(initial: T) -> Self {
        Self::from_parts(Some(initial), None, Some(Write::Assign))
    }

    /// Create a read-only atom computed by `read`.
    ///
    /// `read` receives a getter that records every atom it reads, so the
    /// store knows when the value has to be recomputed.
    pub fn derived<F>(read: F) -> Self
    where
        F: Fn(&Getter<'_>) -> Result<T> + 'static,
    {
        Self::from_parts(None, Some(Rc::new(read)), None)
    }
}

impl<T: AtomValue> Atom<Option<T>> {
    /// Create a primitive atom that starts out as `None`.
    pub fn empty() -> Self {
        Self::new(None)
    }
}

impl<T: AtomValue, A: 'static> Atom<T, A> {
    /// Create a derived atom that can also be written.
    ///
    /// The atom has no initial value, so `write` may not assign to the atom
    /// itself; it forwards to other atoms instead.
    pub fn writable<R, W>(read: R, write: W) -> Self
    where
        R: Fn(&Getter<'_>) -> Result<T> + 'static,
        W: Fn(&Getter<'_>, &Setter<'_>, A) -> Result<()> + 'static,
    {
        Self::from_parts(None, Some(Rc::new(read)), Some(Write::Custom(Rc::new(write))))
    }

    /// Create a primitive atom with a custom write function.
    ///
    /// `write` may assign to the atom itself through the setter, for example
    /// to implement a reducer.
    pub fn with_write<W>(initial: T, write: W) -> Self
    where
        W: Fn(&Getter<'_>, &Setter<'_>, A) -> Result<()> + 'static,
    {
        Self::from_parts(Some(initial), None, Some(Write::Custom(Rc::new(write))))
    }

    fn from_parts(initial: Option<T>, read: Option<ReadFn<T>>, write: Option<Write<A>>) -> Self {
        Self {
            inner: Rc::new(AtomInner {
                id: AtomId::new(),
                label: OnceCell::new(),
                initial,
                read,
                write,
            }),
        }
    }

    /// Attach a debug label, shown by `Display` and in log records.
    ///
    /// The first label wins; later calls keep it.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        let _ = self.inner.label.set(label.into());
        self
    }

    /// The atom's identity.
    pub fn id(&self) -> AtomId {
        self.inner.id
    }

    /// The debug label, if one was attached.
    pub fn label(&self) -> Option<&str> {
        self.inner.label.get().map(String::as_str)
    }

    /// The shape of this atom.
    pub fn kind(&self) -> AtomKind {
        match (&self.inner.read, &self.inner.write) {
            (None, _) => AtomKind::Primitive,
            (Some(_), None) => AtomKind::Derived,
            (Some(_), Some(_)) => AtomKind::Writable,
        }
    }

    /// The initial value, if the atom has one.
    pub fn initial_value(&self) -> Option<&T> {
        self.inner.initial.as_ref()
    }

    /// Whether the atom carries an initial value.
    pub fn has_initial_value(&self) -> bool {
        self.inner.initial.is_some()
    }

    /// Whether the atom accepts writes.
    pub fn is_writable(&self) -> bool {
        self.inner.write.is_some()
    }

    pub(crate) fn write_fn(&self) -> Option<&Write<A>> {
        self.inner.write.as_ref()
    }

    pub(crate) fn key(&self) -> AtomKey {
        AtomKey::new(self.inner.clone())
    }
}

impl<T: AtomValue, A: 'static> ErasedAtom for AtomInner<T, A> {
    fn id(&self) -> AtomId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.get().map(String::as_str)
    }

    fn has_initial_value(&self) -> bool {
        self.initial.is_some()
    }

    fn initial_value(&self) -> Option<Value> {
        self.initial.clone().map(|value| Rc::new(value) as Value)
    }

    fn read(&self, getter: &Getter<'_>) -> Result<Value> {
        match &self.read {
            Some(read) => read(getter).map(|value| Rc::new(value) as Value),
            None => getter.read_own(self),
        }
    }

    fn same_value(&self, previous: &Value, next: &Value) -> bool {
        match (previous.downcast_ref::<T>(), next.downcast_ref::<T>()) {
            (Some(previous), Some(next)) => previous == next,
            _ => false,
        }
    }
}

impl<T, A> Clone for Atom<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, A> PartialEq for Atom<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T, A> Eq for Atom<T, A> {}

impl<T, A> Hash for Atom<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T: AtomValue, A: 'static> fmt::Display for Atom<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}:{}", self.id(), label),
            None => write!(f, "{}", self.id()),
        }
    }
}

impl<T: AtomValue + fmt::Debug, A: 'static> fmt::Debug for Atom<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("kind", &self.kind())
            .field("initial", &self.initial_value())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
