//! Occupied data range detection.

use crate::error::{CoreError, CoreResult};
use sheetpivot_sheet::{CellRect, Sheet, SheetRange};
use std::fmt;
use tracing::info;

/// The rectangle from A1 to the last occupied row and column of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRange {
    pub sheet: String,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl DataRange {
    pub fn rect(&self) -> CellRect {
        CellRect::new(self.start_row, self.start_col, self.end_row, self.end_col)
    }

    pub fn to_sheet_range(&self) -> SheetRange {
        SheetRange::new(&self.sheet, self.rect())
    }
}

impl fmt::Display for DataRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sheet_range())
    }
}

/// Compute the bounding box of all non-empty cells.
///
/// `end_row` is the last row holding any non-empty cell and `end_col` the
/// rightmost non-empty column over all rows. The start is always A1. Empty
/// rows in between or after are scanned but never extend the box.
pub fn detect_range(sheet: &Sheet) -> CoreResult<DataRange> {
    let empty = || CoreError::EmptySheet {
        sheet: sheet.name().to_string(),
    };
    if sheet.row_count() == 0 {
        return Err(empty());
    }

    let mut end_row = 0;
    let mut end_col = 0;
    for (row_idx, row) in sheet.rows().enumerate() {
        if let Some(last) = row.iter().rposition(|cell| !cell.is_empty()) {
            end_row = row_idx + 1;
            end_col = end_col.max(last + 1);
        }
    }

    // Rows exist but every cell is empty: there is no rectangle to report
    if end_row == 0 {
        return Err(empty());
    }

    let range = DataRange {
        sheet: sheet.name().to_string(),
        start_row: 1,
        start_col: 1,
        end_row,
        end_col,
    };
    info!(range = %range, "detected data range");
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetpivot_sheet::CellValue;

    #[test]
    fn test_trailing_empty_rows_ignored() {
        let mut data: Vec<Vec<CellValue>> = (0..5)
            .map(|_| (0..10).map(CellValue::Int).collect())
            .collect();
        data.push(vec![]);
        data.push(vec![CellValue::Null; 12]);
        data.push(vec![CellValue::from(""); 3]);
        let mut sheet = Sheet::with_name("Sheet1");
        *sheet.data_mut() = data;

        let range = detect_range(&sheet).unwrap();
        assert_eq!((range.end_row, range.end_col), (5, 10));
        assert_eq!(range.to_string(), "Sheet1!A1:J5");
    }

    #[test]
    fn test_end_col_is_max_over_rows() {
        let sheet = Sheet::from_data(vec![
            vec![CellValue::from("a")],
            vec![CellValue::Null, CellValue::Null, CellValue::from("c")],
            vec![CellValue::from("b"), CellValue::Null],
        ]);
        let range = detect_range(&sheet).unwrap();
        assert_eq!((range.end_row, range.end_col), (3, 3));
    }

    #[test]
    fn test_interior_empty_row_does_not_stop_scan() {
        let sheet = Sheet::from_data(vec![
            vec![CellValue::from("h")],
            vec![],
            vec![CellValue::Null, CellValue::from("x")],
        ]);
        let range = detect_range(&sheet).unwrap();
        assert_eq!((range.end_row, range.end_col), (3, 2));
    }

    #[test]
    fn test_formulas_and_whitespace_count() {
        let mut sheet = Sheet::from_data(vec![vec!["h"], vec![" "]]);
        sheet.set_formula("C3", "=A1").unwrap();
        let range = detect_range(&sheet).unwrap();
        assert_eq!((range.end_row, range.end_col), (3, 3));
    }

    #[test]
    fn test_zero_rows_is_empty_sheet() {
        let sheet = Sheet::with_name("Blank");
        assert!(matches!(
            detect_range(&sheet),
            Err(CoreError::EmptySheet { sheet }) if sheet == "Blank"
        ));
    }

    #[test]
    fn test_all_empty_cells_is_empty_sheet() {
        let sheet = Sheet::from_data(vec![vec![""], vec![]]);
        assert!(matches!(
            detect_range(&sheet),
            Err(CoreError::EmptySheet { .. })
        ));
    }
}
