//! Formula support: parsing, evaluation, reference extraction, canonical
//! re-printing.

pub mod eval;
pub mod parser;

use rustc_hash::FxHashSet;

use crate::position::Position;
use crate::value::FormulaError;

use parser::Expr;

/// A parsed formula.
///
/// Wraps the expression tree with the operations the cell layer needs:
/// evaluation against a lookup, de-duplicated sorted reference extraction,
/// and canonical source reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    /// Parse formula source without the leading `=` marker.
    pub fn parse(source: &str) -> Result<Self, String> {
        parser::parse(source).map(|expr| Self { expr })
    }

    /// Evaluate, reading referenced cells through `lookup`.
    pub fn evaluate<F>(&self, lookup: &mut F) -> Result<f64, FormulaError>
    where
        F: FnMut(Position) -> Result<f64, FormulaError>,
    {
        eval::evaluate(&self.expr, lookup)
    }

    /// Positions this formula reads from, de-duplicated and sorted.
    pub fn referenced_positions(&self) -> Vec<Position> {
        let mut refs = FxHashSet::default();
        collect_refs(&self.expr, &mut refs);
        let mut out: Vec<Position> = refs.into_iter().collect();
        out.sort();
        out
    }

    /// Normalized formula source, without the leading `=`.
    pub fn canonical_text(&self) -> String {
        self.expr.canonical_text()
    }
}

fn collect_refs(expr: &Expr, refs: &mut FxHashSet<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ref(pos) => {
            refs.insert(*pos);
        }
        Expr::Unary { operand, .. } => collect_refs(operand, refs),
        Expr::Binary { left, right, .. } => {
            collect_refs(left, refs);
            collect_refs(right, refs);
        }
    }
}
