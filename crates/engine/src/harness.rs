//! Test harness for scripted sheet edits.
//!
//! `SheetHarness` wraps a `Sheet` and applies sequences of `Op`s, recording
//! the outcome of each step and re-checking the graph/content invariants
//! after every applied op. Use it to exercise edit-protocol invariants
//! without hand-rolling the same set/assert loops in every test.

use crate::error::EngineError;
use crate::position::Position;
use crate::sheet::Sheet;
use crate::value::Value;

/// Operation to apply to a sheet.
#[derive(Debug, Clone)]
pub enum Op {
    /// Set a cell's content (formulas auto-detected by the `=` prefix).
    Set { pos: Position, text: String },
    /// Reset a cell to empty.
    Clear { pos: Position },
    /// Resolve a cell and assert its value.
    ExpectValue { pos: Position, value: Value },
    /// Assert a cell's raw content text.
    ExpectText { pos: Position, text: String },
}

impl Op {
    pub fn set(pos: &str, text: &str) -> Self {
        Op::Set {
            pos: parse_pos(pos),
            text: text.to_string(),
        }
    }

    pub fn clear(pos: &str) -> Self {
        Op::Clear {
            pos: parse_pos(pos),
        }
    }

    pub fn expect_value(pos: &str, value: Value) -> Self {
        Op::ExpectValue {
            pos: parse_pos(pos),
            value,
        }
    }

    pub fn expect_text(pos: &str, text: &str) -> Self {
        Op::ExpectText {
            pos: parse_pos(pos),
            text: text.to_string(),
        }
    }
}

fn parse_pos(s: &str) -> Position {
    match s.parse() {
        Ok(p) => p,
        Err(e) => panic!("bad position literal {:?}: {}", s, e),
    }
}

/// Outcome of one applied op.
#[derive(Debug)]
pub struct Step {
    pub index: usize,
    pub error: Option<EngineError>,
}

/// Harness wrapping a sheet with per-op invariant checking.
#[derive(Default)]
pub struct SheetHarness {
    sheet: Sheet,
    steps: Vec<Step>,
}

impl SheetHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheet
    }

    /// Errors recorded so far, keyed by op index.
    pub fn errors(&self) -> Vec<(usize, &EngineError)> {
        self.steps
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| (s.index, e)))
            .collect()
    }

    /// Apply every op in order. Edit ops may fail (the error is recorded
    /// and the run continues); expectation ops panic on mismatch.
    pub fn apply_ops(&mut self, ops: &[Op]) {
        for op in ops {
            self.apply(op.clone());
        }
    }

    pub fn apply(&mut self, op: Op) {
        let index = self.steps.len();
        let error = match op {
            Op::Set { pos, ref text } => self.sheet.set(pos, text).err(),
            Op::Clear { pos } => self.sheet.clear(pos).err(),
            Op::ExpectValue { pos, ref value } => {
                let got = self.sheet.value(pos).unwrap();
                assert_eq!(&got, value, "value mismatch at {} (op {})", pos, index);
                None
            }
            Op::ExpectText { pos, ref text } => {
                let got = self.sheet.text(pos).unwrap();
                assert_eq!(&got, text, "text mismatch at {} (op {})", pos, index);
                None
            }
        };
        self.sheet.assert_invariants();
        self.steps.push(Step { index, error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FormulaError;

    #[test]
    fn test_scripted_chain_recalc() {
        let mut harness = SheetHarness::new();
        harness.apply_ops(&[
            Op::set("A1", "1"),
            Op::set("B1", "=A1+1"),
            Op::set("C1", "=B1*2"),
            Op::expect_value("C1", Value::Number(4.0)),
            Op::set("A1", "10"),
            Op::expect_value("C1", Value::Number(22.0)),
        ]);
        assert!(harness.errors().is_empty());
    }

    #[test]
    fn test_scripted_cycle_rejection_continues() {
        let mut harness = SheetHarness::new();
        harness.apply_ops(&[
            Op::set("A1", "=B1+1"),
            Op::set("B1", "=A1"), // rejected
            Op::expect_text("B1", ""),
            Op::set("B1", "2"),
            Op::expect_value("A1", Value::Number(3.0)),
        ]);
        let errors = harness.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0], (1, &EngineError::CircularDependency));
    }

    #[test]
    fn test_scripted_clear_and_error_flow() {
        let mut harness = SheetHarness::new();
        harness.apply_ops(&[
            Op::set("A1", "4"),
            Op::set("B1", "=A1/2"),
            Op::expect_value("B1", Value::Number(2.0)),
            Op::clear("A1"),
            Op::expect_value("B1", Value::Error(FormulaError::Value)),
        ]);
        assert!(harness.errors().is_empty());
    }
}
