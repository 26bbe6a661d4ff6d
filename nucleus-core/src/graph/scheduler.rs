//! Update Ordering
//!
//! When a write changes an atom, every mounted atom downstream of it may
//! have to recompute. They must be processed so that an atom is only
//! revalidated after everything it reads has settled.
//!
//! # Algorithm
//!
//! A depth-first search over the dependents edges, emitting each node after
//! all of its dependents (post-order):
//!
//! 1. Start at the changed atom and mark it visited.
//! 2. Descend into each unvisited dependent, in insertion order.
//! 3. Once a node has no unvisited dependents left, emit it.
//!
//! Reading the result back to front yields the changed atom first and every
//! atom before any of its dependents. Self edges are ignored. The walk keeps
//! an explicit stack, so deep chains do not grow the call stack.

use std::collections::HashSet;
use std::hash::Hash;

use smallvec::SmallVec;

/// Order the nodes reachable from `root` through `dependents`.
///
/// The returned vector is in post-order: `root` comes last and each node
/// appears before every node it is reachable from.
pub(crate) fn topological_order<N, F, I>(root: N, mut dependents: F) -> Vec<N>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut children_of = |node: &N| -> SmallVec<[N; 4]> {
        let mut children: SmallVec<[N; 4]> = dependents(node)
            .into_iter()
            .filter(|child| child != node)
            .collect();
        // Popped from the back, so reverse to visit in insertion order.
        children.reverse();
        children
    };

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(root.clone());
    let mut stack = vec![(root.clone(), children_of(&root))];

    loop {
        let next = match stack.last_mut() {
            Some((_, children)) => children.pop(),
            None => break,
        };

        match next {
            Some(child) => {
                if visited.insert(child.clone()) {
                    let grandchildren = children_of(&child);
                    stack.push((child, grandchildren));
                }
            }
            None => {
                if let Some((node, _)) = stack.pop() {
                    order.push(node);
                }
            }
        }
    }

    order
}
