use serde::{Deserialize, Serialize};

use crate::formula::Formula;
use crate::value::Value;

/// Marker that makes the rest of an input literal text.
pub const ESCAPE_SIGN: char = '\'';
/// Marker that introduces a formula.
pub const FORMULA_SIGN: char = '=';

/// What a cell holds. Closed variant so value resolution stays exhaustive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum CellContent {
    #[default]
    Empty,
    Text(String),
    #[serde(skip)]
    Formula(Formula),
}

impl CellContent {
    /// Raw text as the user would re-edit it: empty string, the literal text
    /// (escape marker intact), or `=` plus the canonical formula.
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("{}{}", FORMULA_SIGN, f.canonical_text()),
        }
    }

    /// Resolve the non-formula kinds to a `Value`. Formula content needs
    /// sheet access and resolves in `Sheet`.
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            CellContent::Empty => Some(Value::Text(String::new())),
            CellContent::Text(s) => {
                // A single leading escape marker is stripped; the rest is
                // literal even if it looks like a formula or number.
                let text = s
                    .strip_prefix(ESCAPE_SIGN)
                    .map(str::to_string)
                    .unwrap_or_else(|| s.clone());
                Some(Value::Text(text))
            }
            CellContent::Formula(_) => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }
}

/// A single cell: content plus the memoized value.
///
/// `cached` is present only while it reflects the current content of this
/// cell and everything reachable through its dependencies; any invalidating
/// edit clears it before it is next observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    pub content: CellContent,
    #[serde(skip)]
    pub(crate) cached: Option<Value>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized value, if still valid.
    pub fn cached_value(&self) -> Option<&Value> {
        self.cached.as_ref()
    }
}
