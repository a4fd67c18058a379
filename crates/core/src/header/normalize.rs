use crate::error::{CoreError, CoreResult};
use sheetpivot_sheet::{to_a1_notation, Sheet};
use tracing::{debug, info};

/// A header cell that was filled from the row beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledHeader {
    /// 1-based column
    pub column: usize,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub filled: Vec<FilledHeader>,
}

/// Fill blank row-1 cells from row 2 across the first `width` columns.
///
/// A row-1 cell counts as blank when it is empty or whitespace-only. When the
/// row-2 cell is empty too, the header stays blank.
pub fn normalize_headers(sheet: &mut Sheet, width: usize) -> CoreResult<NormalizeReport> {
    let mut report = NormalizeReport::default();

    for col in 0..width {
        let header_addr = to_a1_notation(0, col);
        let header = sheet
            .value_at(0, col)
            .map_err(|e| CoreError::read(&header_addr, e))?;
        if !header.is_blank() {
            continue;
        }

        let below = sheet
            .value_at(1, col)
            .map_err(|e| CoreError::read(to_a1_notation(1, col), e))?;
        if below.is_empty() {
            continue;
        }
        if below.is_formula() {
            debug!(cell = %header_addr, "row 2 holds a formula, header left blank");
            continue;
        }

        let fill = below.clone();
        let value = fill.to_string();
        sheet
            .set_cell(0, col, fill)
            .map_err(|e| CoreError::write(&header_addr, e))?;
        debug!(cell = %header_addr, value = %value, "filled blank header");
        report.filled.push(FilledHeader {
            column: col + 1,
            value,
        });
    }

    info!(filled = report.filled.len(), width, "normalized header row");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetpivot_sheet::{CellValue, MAX_COLS};

    #[test]
    fn test_fills_blank_and_whitespace_headers() {
        let mut sheet = Sheet::from_data(vec![
            vec!["Name", "", "  ", "City"],
            vec!["x", "Age", "Zip", "y"],
        ]);
        let report = normalize_headers(&mut sheet, 4).unwrap();

        assert_eq!(sheet.get_a1("B1").unwrap(), &CellValue::from("Age"));
        assert_eq!(sheet.get_a1("C1").unwrap(), &CellValue::from("Zip"));
        assert_eq!(sheet.get_a1("A1").unwrap(), &CellValue::from("Name"));
        assert_eq!(
            report.filled,
            vec![
                FilledHeader {
                    column: 2,
                    value: "Age".to_string()
                },
                FilledHeader {
                    column: 3,
                    value: "Zip".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_blank_over_blank_stays_blank() {
        let mut sheet = Sheet::from_data(vec![vec!["a", ""], vec!["b", ""]]);
        let report = normalize_headers(&mut sheet, 2).unwrap();

        assert!(report.filled.is_empty());
        assert_eq!(sheet.get_a1("B1").unwrap(), &CellValue::from(""));
    }

    #[test]
    fn test_formula_below_is_not_copied() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "", ""], vec!["1", "", "ABC 类"]]);
        sheet.set_formula("B2", "=A2*2").unwrap();

        let report = normalize_headers(&mut sheet, 3).unwrap();

        assert_eq!(sheet.get_a1("B1").unwrap(), &CellValue::from(""));
        assert_eq!(sheet.get_a1("C1").unwrap(), &CellValue::from("ABC 类"));
        assert_eq!(report.filled.len(), 1);
        assert_eq!(report.filled[0].column, 3);
    }

    #[test]
    fn test_width_limits_inspection() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "", ""], vec!["b", "c", "d"]]);
        let report = normalize_headers(&mut sheet, 2).unwrap();

        assert_eq!(report.filled.len(), 1);
        assert_eq!(sheet.get_a1("C1").unwrap(), &CellValue::from(""));
    }

    #[test]
    fn test_width_beyond_data_is_harmless() {
        let mut sheet = Sheet::from_data(vec![vec!["a"]]);
        let report = normalize_headers(&mut sheet, 45).unwrap();

        assert!(report.filled.is_empty());
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.col_count(), 1);
    }

    #[test]
    fn test_single_row_sheet() {
        let mut sheet = Sheet::from_data(vec![vec!["", "b"]]);
        assert!(normalize_headers(&mut sheet, 2).unwrap().filled.is_empty());
    }

    #[test]
    fn test_unreadable_cell_is_read_error() {
        let mut sheet = Sheet::from_data(vec![vec!["a"]]);
        let err = normalize_headers(&mut sheet, MAX_COLS + 1).unwrap_err();
        assert!(matches!(err, CoreError::Read { .. }));
    }
}
