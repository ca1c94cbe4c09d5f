//! Dependency graph for formula cells.
//!
//! Tracks, per cell, the cells its formula reads from (dependencies) and the
//! cells whose formulas read from it (dependents).
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B reads from A"  (A is a dependency of B)
//! ```
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** A ∈ deps[B] iff B ∈ dependents[A], after
//!    every mutation, never just eventually.
//! 2. **No dangling entries:** Empty sets are removed, not stored.
//! 3. **No duplicate edges:** Set semantics enforced by FxHashSet.
//! 4. **Atomic updates:** `replace_edges` is the only mutator that touches
//!    both maps.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::position::Position;

#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// Dependencies: for each formula cell B, the cells A it reads from.
    /// B -> {A1, A2, ...}
    deps: FxHashMap<Position, FxHashSet<Position>>,

    /// Dependents: for each referenced cell A, the formula cells B that read
    /// from it. A -> {B1, B2, ...}
    dependents: FxHashMap<Position, FxHashSet<Position>>,
}

impl DepGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cells this cell's formula reads from (outgoing edges).
    pub fn dependencies(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.deps
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// The cells whose formulas read from this cell (incoming edges).
    pub fn dependents(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// True iff at least one formula currently reads from this cell.
    pub fn is_referenced(&self, cell: Position) -> bool {
        // No-dangling invariant: presence of the key implies a non-empty set.
        self.dependents.contains_key(&cell)
    }

    /// Replace all outgoing edges for a cell atomically.
    ///
    /// 1. Removes the cell from all its old dependencies' dependent sets
    /// 2. Clears the cell's dependency set
    /// 3. Adds the cell to all new dependencies' dependent sets
    /// 4. Stores the cell's new dependency set
    ///
    /// Pass an empty set for non-formula content.
    pub fn replace_edges(&mut self, cell: Position, new_deps: FxHashSet<Position>) {
        if let Some(old_deps) = self.deps.remove(&cell) {
            for dep in old_deps {
                if let Some(readers) = self.dependents.get_mut(&dep) {
                    readers.remove(&cell);
                    if readers.is_empty() {
                        self.dependents.remove(&dep);
                    }
                }
            }
        }

        if new_deps.is_empty() {
            return;
        }

        for dep in &new_deps {
            self.dependents.entry(*dep).or_default().insert(cell);
        }
        self.deps.insert(cell, new_deps);
    }

    /// Drop all outgoing edges for a cell (content is no longer a formula).
    pub fn clear_cell(&mut self, cell: Position) {
        self.replace_edges(cell, FxHashSet::default());
    }

    /// True iff `target` is reachable from `from` along existing dependency
    /// edges.
    ///
    /// Used for pre-commit cycle detection: a candidate formula on `root`
    /// closes a cycle iff some referenced position reaches `root`. Iterative
    /// DFS; the visited set only avoids rework on diamond-shaped graphs, the
    /// acyclicity invariant already guarantees termination.
    pub fn reaches(&self, from: Position, target: Position) -> bool {
        let mut visited: FxHashSet<Position> = FxHashSet::default();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.dependencies(current));
        }

        false
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for (cell, deps) in &self.deps {
            for dep in deps {
                assert!(
                    self.dependents.get(dep).is_some_and(|s| s.contains(cell)),
                    "missing dependent edge: {} should list {} as a reader",
                    dep,
                    cell
                );
            }
        }

        for (cell, readers) in &self.dependents {
            for reader in readers {
                assert!(
                    self.deps.get(reader).is_some_and(|s| s.contains(cell)),
                    "missing dependency edge: {} should list {} as a dependency",
                    reader,
                    cell
                );
            }
        }

        for (cell, deps) in &self.deps {
            assert!(!deps.is_empty(), "empty dependency set stored for {}", cell);
        }
        for (cell, readers) in &self.dependents {
            assert!(!readers.is_empty(), "empty dependent set stored for {}", cell);
        }
    }
}
