//! Reactive spreadsheet engine: cells, a dependency graph, and formulas.
//!
//! The engine keeps formula results memoized and consistent across edits.
//! Every edit goes through the same protocol: classify the input, parse and
//! cycle-check formulas before committing, then invalidate the memoized
//! values of everything downstream. Values are resolved lazily on read.
//!
//! No GUI or I/O coupling beyond `Write` sinks for the print helpers.

pub mod cell;
pub mod dep_graph;
pub mod error;
pub mod formula;
pub mod position;
pub mod sheet;
pub mod value;

#[cfg(test)]
pub mod harness;

pub use cell::{Cell, CellContent, ESCAPE_SIGN, FORMULA_SIGN};
pub use dep_graph::DepGraph;
pub use error::EngineError;
pub use formula::Formula;
pub use position::{Position, MAX_COLS, MAX_ROWS};
pub use sheet::{Sheet, Size};
pub use value::{FormulaError, Value};
