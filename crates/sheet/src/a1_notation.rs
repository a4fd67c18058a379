use crate::error::{Result, SheetError};

/// Number of rows in an Excel worksheet grid.
pub const MAX_ROWS: usize = 1_048_576;
/// Number of columns in an Excel worksheet grid (A..XFD).
pub const MAX_COLS: usize = 16_384;

/// Parse a cell address such as `C2`, `ax5538` or `$P$1` into 0-based
/// `(row, col)`.
pub fn parse_a1(notation: &str) -> Result<(usize, usize)> {
    let invalid = || SheetError::InvalidCellNotation(notation.to_string());

    // Absolute markers ($A$1) address the same cell
    let cleaned = notation.trim().replace('$', "").to_ascii_uppercase();
    let digits = cleaned
        .find(|c: char| c.is_ascii_digit())
        .filter(|&pos| pos > 0)
        .ok_or_else(invalid)?;
    let (letters, number) = cleaned.split_at(digits);

    let col = column_letters_to_index(letters).ok_or_else(invalid)?;
    let row: usize = number.parse().map_err(|_| invalid())?;
    if row == 0 || row > MAX_ROWS || col >= MAX_COLS {
        return Err(invalid());
    }
    Ok((row - 1, col))
}

/// Parse `A1:K6` into 0-based corners, top-left first. A single address is
/// a one-cell range.
pub fn parse_a1_range(notation: &str) -> Result<((usize, usize), (usize, usize))> {
    let Some((first, last)) = notation.split_once(':') else {
        let cell = parse_a1(notation)?;
        return Ok((cell, cell));
    };
    let (r1, c1) = parse_a1(first)?;
    let (r2, c2) = parse_a1(last)?;
    Ok(((r1.min(r2), c1.min(c2)), (r1.max(r2), c1.max(c2))))
}

fn column_letters_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 || !letters.bytes().all(|b| b.is_ascii_uppercase())
    {
        return None;
    }
    let number = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A') + 1);
    Some(number - 1)
}

/// 0-based column index to letters: 0 is `A`, 27 is `AB`.
pub fn column_index_to_letters(col: usize) -> String {
    let mut remaining = col + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        letters.push(b'A' + digit as u8);
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}

/// 0-based `(row, col)` to an address, `(1, 2)` is `C2`.
pub fn to_a1_notation(row: usize, col: usize) -> String {
    format!("{}{}", column_index_to_letters(col), row + 1)
}

/// An inclusive rectangle of cells using 1-based row and column numbers,
/// the way addresses appear to spreadsheet users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRect {
    #[must_use]
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    /// Parse "A1:K6" (or a single cell) into a rectangle.
    pub fn from_a1_range(notation: &str) -> Result<Self> {
        let ((sr, sc), (er, ec)) = parse_a1_range(notation)?;
        Ok(Self::new(sr + 1, sc + 1, er + 1, ec + 1))
    }

    /// Render as "A1:K6".
    #[must_use]
    pub fn to_a1_range(&self) -> String {
        format!(
            "{}:{}",
            to_a1_notation(self.start_row - 1, self.start_col - 1),
            to_a1_notation(self.end_row - 1, self.end_col - 1)
        )
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.end_row + 1 - self.start_row
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.end_col + 1 - self.start_col
    }
}
