//! Sheet/Book model for sheetpivot
//!
//! An in-memory workbook that reads and writes XLSX files. Cells hold plain
//! values or formula text; formulas are stored as written and left for the
//! spreadsheet application to evaluate. Pivot tables registered on a
//! [`Book`] are embedded into the saved package.
//!
//! # Examples
//!
//! ```
//! use sheetpivot_sheet::{CellValue, Sheet};
//!
//! let mut sheet = Sheet::from_data(vec![
//!     vec!["A", "B", "Total"],
//!     vec!["10", "20", ""],
//! ]);
//!
//! sheet.set_formula("C2", "=SUM(A2,B2)").unwrap();
//! assert_eq!(
//!     sheet.get_a1("C2").unwrap(),
//!     &CellValue::Formula("=SUM(A2,B2)".to_string())
//! );
//! ```
//!
//! ## Working with books
//!
//! ```
//! use sheetpivot_sheet::{Book, Sheet};
//!
//! let mut book = Book::new();
//! book.add_sheet("Data", Sheet::new()).unwrap();
//! let pivot = book.new_sheet("Summary").unwrap();
//! book.set_active_sheet(pivot).unwrap();
//!
//! assert_eq!(book.sheet_count(), 2);
//! assert_eq!(book.active_sheet().unwrap().name(), "Summary");
//! ```

mod a1_notation;
mod book;
mod cell;
mod error;
mod pivot;
mod pivot_xml;
mod sheet;
mod xlsx;

/// Re-export A1 address helpers.
pub use a1_notation::{
    column_index_to_letters, parse_a1, parse_a1_range, to_a1_notation, CellRect, MAX_COLS,
    MAX_ROWS,
};
/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export pivot table model.
pub use pivot::{
    Aggregation, PivotDataField, PivotField, PivotTable, PivotTableOptions, SheetRange,
};
/// Re-export sheet type.
pub use sheet::Sheet;
