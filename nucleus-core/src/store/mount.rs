//! Mount Manager
//!
//! Maintains the observed subgraph: every atom with a listener, plus
//! everything such an atom reads, transitively.
//!
//! # Lifecycle
//!
//! - `mount` evaluates an atom so its dependencies are known, mounts each of
//!   them and registers the atom as their dependent.
//! - `unmount` drops an atom's mount record once nothing keeps it: no
//!   listeners and no mounted dependent that still lists it. It then tries
//!   to unmount each former dependency in turn.
//! - `mount_dependencies` reconciles a mounted atom's edges after it was
//!   re-evaluated, so the observed subgraph follows conditional reads.

use smallvec::SmallVec;
use tracing::debug;

use crate::atom::AtomKey;
use crate::error::Result;
use crate::graph::Mounted;

use super::Store;

type Keys = SmallVec<[AtomKey; 4]>;

impl Store {
    /// Mount `atom` and its dependencies. Idempotent.
    pub(crate) fn mount(&self, atom: &AtomKey) -> Result<()> {
        if self.is_mounted_id(atom.id()) {
            return Ok(());
        }

        self.resolve(atom, None)?;
        let dependencies = self.recorded_dependencies(atom);
        for dependency in &dependencies {
            self.mount(dependency)?;
            self.with_mounted(dependency.id(), |mounted| {
                mounted.dependents.insert(atom.clone())
            });
        }

        let mut states = self.inner.states.borrow_mut();
        let state = states.entry(atom.id()).or_default();
        if state.mounted.is_none() {
            state.mounted = Some(Mounted::new(dependencies.iter().cloned().collect()));
            debug!(
                store = %self.name(),
                atom = %atom,
                dependencies = dependencies.len(),
                "mounted atom"
            );
        }
        Ok(())
    }

    /// Unmount `atom` if nothing keeps it mounted, cascading upstream.
    pub(crate) fn unmount(&self, atom: &AtomKey) {
        let former_dependencies = {
            let mut states = self.inner.states.borrow_mut();
            let retained = match states.get(&atom.id()).and_then(|state| state.mounted.as_ref()) {
                None => return,
                Some(mounted) => {
                    mounted.has_listeners()
                        || mounted.dependents.iter().any(|dependent| {
                            states
                                .get(&dependent.id())
                                .and_then(|state| state.mounted.as_ref())
                                .is_some_and(|mounted| mounted.dependencies.contains(atom))
                        })
                }
            };
            if retained {
                return;
            }
            match states.get_mut(&atom.id()).and_then(|state| state.mounted.take()) {
                Some(mounted) => mounted.dependencies,
                None => return,
            }
        };
        debug!(store = %self.name(), atom = %atom, "unmounted atom");

        for dependency in former_dependencies.iter().filter(|dependency| *dependency != atom) {
            self.with_mounted(dependency.id(), |mounted| {
                mounted.dependents.shift_remove(atom)
            });
            self.unmount(dependency);
        }
    }

    /// Bring the mounted edges of `atom` in line with its recorded
    /// dependencies. Does nothing for unmounted atoms.
    pub(crate) fn mount_dependencies(&self, atom: &AtomKey) -> Result<()> {
        let Some(mirrored) = self.with_mounted(atom.id(), |mounted| {
            mounted.dependencies.iter().cloned().collect::<Keys>()
        }) else {
            return Ok(());
        };
        let recorded = self.recorded_dependencies(atom);

        for dependency in recorded.iter().filter(|d| !mirrored.contains(d)) {
            self.mount(dependency)?;
            self.with_mounted(dependency.id(), |mounted| {
                mounted.dependents.insert(atom.clone())
            });
            self.with_mounted(atom.id(), |mounted| {
                mounted.dependencies.insert(dependency.clone())
            });
        }

        for dependency in mirrored.iter().filter(|d| !recorded.contains(d)) {
            self.with_mounted(atom.id(), |mounted| {
                mounted.dependencies.shift_remove(dependency)
            });
            self.with_mounted(dependency.id(), |mounted| {
                mounted.dependents.shift_remove(atom)
            });
            self.unmount(dependency);
        }
        Ok(())
    }

    /// Dependencies recorded at the last evaluation, without self edges.
    fn recorded_dependencies(&self, atom: &AtomKey) -> Keys {
        self.inner
            .states
            .borrow()
            .get(&atom.id())
            .map(|state| {
                state
                    .dependencies
                    .keys()
                    .filter(|dependency| *dependency != atom)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mounted atoms that read `atom`.
    pub(crate) fn mounted_dependents(&self, atom: &AtomKey) -> Keys {
        self.with_mounted(atom.id(), |mounted| {
            mounted.dependents.iter().cloned().collect()
        })
        .unwrap_or_default()
    }

    #[cfg(test)]
    fn mounted_edges(
        &self,
        atom: &AtomKey,
    ) -> Option<(indexmap::IndexSet<AtomKey>, indexmap::IndexSet<AtomKey>)> {
        self.with_mounted(atom.id(), |mounted| {
            (mounted.dependencies.clone(), mounted.dependents.clone())
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
