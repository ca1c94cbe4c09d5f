//! Cell position for the sheet and dependency graph.
//!
//! A `Position` uniquely identifies a cell. It is the node identity in the
//! dependency graph and the key into the cell store.

use serde::{Deserialize, Serialize};

/// Exclusive upper bound on row indices.
pub const MAX_ROWS: usize = 16_384;
/// Exclusive upper bound on column indices.
pub const MAX_COLS: usize = 16_384;

/// A (row, column) pair, zero-based.
///
/// Orders by row first, then column, so sorted reference lists read
/// top-to-bottom, left-to-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
}

impl Position {
    /// Create a new Position.
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True iff both components are within the addressable range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    /// Parse an A1-style reference like `B2` or `AA10`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letters_len = s
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
        let (letters, digits) = s.split_at(letters_len);
        if letters.is_empty() || digits.is_empty() {
            return Err(format!("invalid cell reference: {}", s));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid cell reference: {}", s));
        }
        let col = letters_to_col(letters).ok_or_else(|| format!("invalid column: {}", letters))?;
        let row: usize = digits
            .parse()
            .map_err(|_| format!("invalid row: {}", digits))?;
        if row == 0 {
            return Err(format!("invalid row: {}", digits));
        }
        let pos = Position::new(row - 1, col);
        if !pos.is_valid() {
            return Err(format!("cell reference out of range: {}", s));
        }
        Ok(pos)
    }
}

/// Convert 0-based column index to Excel-style letter(s).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert column letters to a 0-based index (A=0, B=1, ..., AA=26).
///
/// Returns None for empty input or on overflow.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let d = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        col = col.checked_mul(26)?.checked_add(d)?;
    }
    Some(col - 1)
}
