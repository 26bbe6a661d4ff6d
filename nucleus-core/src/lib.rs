//! Nucleus Core
//!
//! This crate provides an atom store: a container for small, composable
//! units of state whose derived values are kept up to date automatically.
//!
//! - Primitive atoms hold a value that can be read and replaced.
//! - Derived atoms compute their value from other atoms and are evaluated
//!   lazily, on first read.
//! - Writable atoms run a custom write function that may update any number
//!   of other atoms as a single batch.
//!
//! Atoms are only descriptors. All runtime state lives in a [`Store`], so
//! the same atom can have independent values in independent stores.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `atom`: Atom descriptors and their identity
//! - `store`: Evaluation, mounting, propagation and subscriptions
//! - `graph`: Per-atom state records and dependency ordering
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use nucleus_core::{Atom, Store};
//!
//! let store = Store::new();
//! let count = Atom::new(1);
//! let doubled = {
//!     let count = count.clone();
//!     Atom::derived(move |get| Ok(get.get(&count)? * 2))
//! };
//!
//! let seen = Rc::new(Cell::new(0));
//! let _subscription = {
//!     let (reader, target, seen) = (store.clone(), doubled.clone(), seen.clone());
//!     store
//!         .subscribe(&doubled, move || seen.set(reader.get(&target).unwrap()))
//!         .unwrap()
//! };
//!
//! store.set(&count, 5).unwrap();
//! assert_eq!(seen.get(), 10);
//! ```

pub mod atom;
pub mod store;

mod config;
mod error;
mod graph;

pub use atom::{Atom, AtomId, AtomKind, AtomValue, ReadFn, WriteFn};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use store::{default_store, Getter, ListenerId, Setter, Store, Subscription};
