//! The sheet: cell store, edit protocol, and lazy value resolution.
//!
//! A `Sheet` owns every cell in a single arena keyed by `Position`; the
//! dependency graph links positions, never cell references, so edits can
//! rewire edges without aliasing hazards.
//!
//! An edit either fully commits (content, edges, and invalidation all
//! applied) or fully aborts — except that Empty placeholder cells
//! materialized while checking a candidate formula for cycles persist even
//! when the edit is rejected: a position becomes a real cell the moment
//! something references it.

use std::collections::BTreeMap;
use std::io;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{Cell, CellContent, FORMULA_SIGN};
use crate::dep_graph::DepGraph;
use crate::error::EngineError;
use crate::formula::Formula;
use crate::position::Position;
use crate::value::{FormulaError, Value};

/// Printable-area size: one past the largest row/column holding an
/// explicitly set cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug, Default)]
pub struct Sheet {
    cells: FxHashMap<Position, Cell>,
    graph: DepGraph,
    /// Explicitly set positions (materialized placeholders included).
    occupied: FxHashSet<Position>,
    /// Occupancy per row/column index, for printable-size queries.
    row_counts: BTreeMap<usize, usize>,
    col_counts: BTreeMap<usize, usize>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell's content from raw input text.
    ///
    /// Classification: empty input is Empty; input starting with `=` and at
    /// least one more character is a formula (a lone `=` is plain text);
    /// anything else is text.
    ///
    /// For formulas the candidate is parsed and cycle-checked before any
    /// graph or content change. On acceptance: invalidate the cell's current
    /// dependents, replace content, rebuild edges, invalidate again from the
    /// cell outward.
    pub fn set(&mut self, pos: Position, text: &str) -> Result<(), EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }

        let content = if text.is_empty() {
            CellContent::Empty
        } else if text.starts_with(FORMULA_SIGN) && text.len() > 1 {
            let formula = Formula::parse(&text[1..]).map_err(EngineError::FormulaSyntax)?;
            self.check_circular(pos, &formula.referenced_positions())?;
            CellContent::Formula(formula)
        } else {
            CellContent::Text(text.to_string())
        };

        // Dependents must lose stale caches regardless of what the new
        // content turns out to be.
        self.invalidate(pos);
        self.mark_occupied(pos);
        self.cells.entry(pos).or_default().content = content;
        self.rebuild_edges(pos);
        self.invalidate(pos);
        Ok(())
    }

    /// Reset a cell's content to Empty.
    ///
    /// The cell stays in the store (it may still be a dependency target) but
    /// leaves the printable area.
    pub fn clear(&mut self, pos: Position) -> Result<(), EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        self.invalidate(pos);
        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.content = CellContent::Empty;
        }
        self.rebuild_edges(pos);
        self.invalidate(pos);
        self.mark_unoccupied(pos);
        Ok(())
    }

    /// Look up a cell without creating it. Untouched positions are None.
    pub fn get(&self, pos: Position) -> Result<Option<&Cell>, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }
        Ok(self.cells.get(&pos))
    }

    /// Resolve a cell's value, computing and caching it if needed.
    /// Untouched positions read as the empty text value.
    pub fn value(&mut self, pos: Position) -> Result<Value, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }
        Ok(self.resolve(pos))
    }

    /// Raw content text: empty string, literal text, or `=` plus the
    /// canonical formula.
    pub fn text(&self, pos: Position) -> Result<String, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }
        Ok(self
            .cells
            .get(&pos)
            .map(|c| c.content.text())
            .unwrap_or_default())
    }

    /// The positions this cell's formula reads from, sorted. Empty for
    /// non-formula content.
    pub fn referenced_positions(&self, pos: Position) -> Result<Vec<Position>, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }
        Ok(match self.cells.get(&pos).map(|c| &c.content) {
            Some(CellContent::Formula(f)) => f.referenced_positions(),
            _ => Vec::new(),
        })
    }

    /// True iff at least one formula currently reads from this cell.
    pub fn is_referenced(&self, pos: Position) -> Result<bool, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition(pos));
        }
        Ok(self.graph.is_referenced(pos))
    }

    // =========================================================================
    // Cycle detection (pre-commit)
    // =========================================================================

    /// Reject a candidate formula on `root` if any referenced position can
    /// reach `root` along existing dependency edges.
    ///
    /// Each referenced position is materialized as an Empty cell right
    /// before it is visited, and those materializations are committed even
    /// when the walk ends in rejection: earlier-visited placeholders stay.
    fn check_circular(&mut self, root: Position, refs: &[Position]) -> Result<(), EngineError> {
        for &r in refs {
            self.materialize(r);
            if r == root || self.graph.reaches(r, root) {
                return Err(EngineError::CircularDependency);
            }
        }
        Ok(())
    }

    /// Create a store-backed Empty cell for a referenced position that was
    /// never explicitly written, so graph edges always point at real cells.
    fn materialize(&mut self, pos: Position) {
        if !self.cells.contains_key(&pos) {
            self.cells.insert(pos, Cell::new());
            self.mark_occupied(pos);
        }
    }

    // =========================================================================
    // Graph maintenance + cache invalidation
    // =========================================================================

    /// Make the graph reflect the cell's current content. Not failable:
    /// cycles were ruled out before the content was committed.
    fn rebuild_edges(&mut self, pos: Position) {
        let refs = match self.cells.get(&pos).map(|c| &c.content) {
            Some(CellContent::Formula(f)) => f.referenced_positions(),
            _ => Vec::new(),
        };
        let mut new_deps = FxHashSet::default();
        for r in refs {
            self.materialize(r);
            new_deps.insert(r);
        }
        self.graph.replace_edges(pos, new_deps);
    }

    /// Clear the memoized value of `pos` and, transitively, of every cell
    /// that reads from it. Explicit worklist; already-empty caches are still
    /// traversed so dependents further out cannot keep a stale memo.
    fn invalidate(&mut self, pos: Position) {
        let mut visited: FxHashSet<Position> = FxHashSet::default();
        let mut stack = vec![pos];

        while let Some(p) = stack.pop() {
            if !visited.insert(p) {
                continue;
            }
            if let Some(cell) = self.cells.get_mut(&p) {
                cell.cached = None;
            }
            stack.extend(self.graph.dependents(p));
        }
    }

    // =========================================================================
    // Value resolution
    // =========================================================================

    /// Resolve and memoize. Recursion depth equals the longest dependency
    /// chain; the graph is acyclic between edits, so this terminates.
    fn resolve(&mut self, pos: Position) -> Value {
        let content = match self.cells.get(&pos) {
            None => return Value::Text(String::new()),
            Some(cell) => {
                if let Some(v) = &cell.cached {
                    return v.clone();
                }
                cell.content.clone()
            }
        };

        let value = match &content {
            CellContent::Formula(f) => match f.evaluate(&mut |p| self.lookup_number(p)) {
                Ok(n) => Value::Number(n),
                Err(e) => Value::Error(e),
            },
            other => other
                .literal_value()
                .unwrap_or_else(|| Value::Text(String::new())),
        };

        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.cached = Some(value.clone());
        }
        value
    }

    /// The lookup handed to the formula evaluator.
    ///
    /// Numbers pass through; text must parse strictly as a number or the
    /// whole evaluation fails with `Value`; an errored cell propagates its
    /// own category unchanged.
    fn lookup_number(&mut self, pos: Position) -> Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        match self.resolve(pos) {
            Value::Number(n) => Ok(n),
            Value::Text(s) => s.parse().map_err(|_| FormulaError::Value),
            Value::Error(e) => Err(e),
        }
    }

    // =========================================================================
    // Printable area
    // =========================================================================

    fn mark_occupied(&mut self, pos: Position) {
        if self.occupied.insert(pos) {
            *self.row_counts.entry(pos.row).or_insert(0) += 1;
            *self.col_counts.entry(pos.col).or_insert(0) += 1;
        }
    }

    fn mark_unoccupied(&mut self, pos: Position) {
        if self.occupied.remove(&pos) {
            if let Some(count) = self.row_counts.get_mut(&pos.row) {
                *count -= 1;
                if *count == 0 {
                    self.row_counts.remove(&pos.row);
                }
            }
            if let Some(count) = self.col_counts.get_mut(&pos.col) {
                *count -= 1;
                if *count == 0 {
                    self.col_counts.remove(&pos.col);
                }
            }
        }
    }

    /// Current printable area.
    pub fn printable_size(&self) -> Size {
        Size {
            rows: self.row_counts.keys().next_back().map_or(0, |r| r + 1),
            cols: self.col_counts.keys().next_back().map_or(0, |c| c + 1),
        }
    }

    /// Write the printable area as tab-separated resolved values, one line
    /// per row. Resolving may fill caches, hence `&mut self`.
    pub fn print_values(&mut self, out: &mut impl io::Write) -> io::Result<()> {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                let pos = Position::new(row, col);
                if self.cells.contains_key(&pos) {
                    write!(out, "{}", self.resolve(pos))?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Write the printable area as tab-separated raw cell texts.
    pub fn print_texts(&self, out: &mut impl io::Write) -> io::Result<()> {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    write!(out, "{}", cell.content.text())?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Graph/content cross-check for tests: edges mirror formula content and
    /// both adjacency maps agree.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.graph.assert_consistent();
        for (pos, cell) in &self.cells {
            let mut expected = match &cell.content {
                CellContent::Formula(f) => f.referenced_positions(),
                _ => Vec::new(),
            };
            let mut actual: Vec<Position> = self.graph.dependencies(*pos).collect();
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected, "edges out of sync for {}", pos);
            for dep in actual {
                assert!(
                    self.cells.contains_key(&dep),
                    "dangling edge {} -> {}",
                    pos,
                    dep
                );
            }
        }
    }
}
