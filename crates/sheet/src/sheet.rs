use crate::a1_notation::{self, MAX_COLS, MAX_ROWS};
use crate::cell::CellValue;
use crate::error::{Result, SheetError};

static NULL_CELL: CellValue = CellValue::Null;

/// A sheet representing a 2D grid of cells (row-major storage)
///
/// Rows are ragged: a row may hold fewer cells than its neighbours, or none
/// at all. Cells that were never populated read back as [`CellValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        Sheet {
            name: "Sheet1".to_string(),
            data: converted,
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Get the width of the widest row
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the sheet is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // ===== Cell Access =====

    /// Get a cell value by row and column index (0-based).
    ///
    /// Positions inside the worksheet grid that hold no data read as `Null`;
    /// positions outside the grid are an error.
    pub fn value_at(&self, row: usize, col: usize) -> Result<&CellValue> {
        check_bounds(row, col)?;
        Ok(self
            .data
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL))
    }

    /// Set a cell value by row and column index (0-based), growing the grid.
    pub fn set_cell<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        check_bounds(row, col)?;
        if self.data.len() <= row {
            self.data.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.data[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Null);
        }
        cells[col] = value.into();
        Ok(())
    }

    // ===== A1-Style Notation Access =====

    /// Get a cell value using A1-style notation (e.g., "A1", "B2")
    pub fn get_a1(&self, notation: &str) -> Result<&CellValue> {
        let (row, col) = a1_notation::parse_a1(notation)?;
        self.value_at(row, col)
    }

    /// Set a cell value using A1-style notation
    pub fn set_a1<T: Into<CellValue>>(&mut self, notation: &str, value: T) -> Result<()> {
        let (row, col) = a1_notation::parse_a1(notation)?;
        self.set_cell(row, col, value)
    }

    /// Set a formula in a cell using A1-style notation (e.g., "C2", "=SUM(A2,B2)").
    ///
    /// The formula text is stored, not evaluated. A missing leading `=` is added.
    pub fn set_formula(&mut self, notation: &str, formula: &str) -> Result<()> {
        let (row, col) = a1_notation::parse_a1(notation)?;
        let body = formula.trim().trim_start_matches('=').trim();
        if body.is_empty() {
            return Err(SheetError::InvalidFormula {
                cell: notation.to_string(),
                reason: "formula text is empty".to_string(),
            });
        }
        self.set_cell(row, col, CellValue::formula(formula))
    }

    // ===== Row Access =====

    /// Get a row by 0-based index, if present
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Vec<CellValue>> {
        self.data.get(index)
    }

    /// Iterate over rows
    pub fn rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter()
    }

    /// Copy of every row as it stands now.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Vec<CellValue>> {
        self.data.clone()
    }

    /// Get reference to underlying data
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Get mutable reference to underlying data
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }
}

fn check_bounds(row: usize, col: usize) -> Result<()> {
    if row >= MAX_ROWS || col >= MAX_COLS {
        return Err(SheetError::CellOutOfRange {
            row,
            col,
            max_rows: MAX_ROWS,
            max_cols: MAX_COLS,
        });
    }
    Ok(())
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}
