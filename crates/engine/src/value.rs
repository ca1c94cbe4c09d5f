//! The scalar value a cell resolves to.
//!
//! Formula failures are ordinary values here, not faults: an errored cell
//! caches its `Value::Error` and dependents propagate it like any other
//! result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error category carried inside a `Value::Error`.
///
/// These never abort an edit; they surface on read, cache normally, and
/// propagate through formulas that reference the errored cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum FormulaError {
    /// A referenced position is outside the addressable range.
    #[error("#REF!")]
    Ref,
    /// A referenced cell's text cannot be read as a number.
    #[error("#VALUE!")]
    Value,
    /// Division by zero.
    #[error("#DIV/0!")]
    Div0,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Display form, allocated. Numbers follow the integral-vs-fractional
    /// rule so `2.0` reads as `2`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

/// Shared number rendering for values and canonical formula text.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}
