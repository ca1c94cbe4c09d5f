//! Edit-aborting failures.
//!
//! Only these three reject an operation. Everything else a formula can go
//! wrong with resolves to a `Value::Error` and caches normally (see
//! `value::FormulaError`).

use thiserror::Error;

use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Position outside the addressable range. Caller error; the sheet is
    /// untouched.
    #[error("position out of range: ({}, {})", .0.row, .0.col)]
    InvalidPosition(Position),

    /// Malformed formula text. The edit is rejected with no state change.
    #[error("formula syntax error: {0}")]
    FormulaSyntax(String),

    /// The candidate formula would close a dependency cycle. The edit is
    /// rejected; only Empty placeholders materialized during the check
    /// persist.
    #[error("circular dependency detected")]
    CircularDependency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            EngineError::InvalidPosition(Position::new(20_000, 3)).to_string(),
            "position out of range: (20000, 3)"
        );
        assert_eq!(
            EngineError::FormulaSyntax("unexpected character: #".into()).to_string(),
            "formula syntax error: unexpected character: #"
        );
        assert_eq!(
            EngineError::CircularDependency.to_string(),
            "circular dependency detected"
        );
    }
}
