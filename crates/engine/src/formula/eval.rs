// Formula evaluator - reduces an expression tree to a number or an error value

use crate::position::Position;
use crate::value::FormulaError;

use super::parser::{Expr, Op, UnaryOp};

/// Evaluate an expression against a cell-value lookup.
///
/// The lookup resolves a referenced position to a number or fails with the
/// error category that becomes the result of the whole evaluation. No other
/// failure path exists: every fault surfaces as a `FormulaError`.
pub fn evaluate<F>(expr: &Expr, lookup: &mut F) -> Result<f64, FormulaError>
where
    F: FnMut(Position) -> Result<f64, FormulaError>,
{
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(pos) => lookup(*pos),
        Expr::Unary { op, operand } => {
            let v = evaluate(operand, lookup)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Minus => -v,
            })
        }
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, lookup)?;
            let r = evaluate(right, lookup)?;
            match op {
                Op::Add => Ok(l + r),
                Op::Sub => Ok(l - r),
                Op::Mul => Ok(l * r),
                Op::Div => {
                    let q = l / r;
                    if q.is_finite() {
                        Ok(q)
                    } else {
                        Err(FormulaError::Div0)
                    }
                }
            }
        }
    }
}
