use super::resolve::{resolve, ColumnRef, HeaderRow};
use crate::error::{CoreError, CoreResult};
use sheetpivot_sheet::{CellValue, Sheet, SheetError, MAX_COLS, MAX_ROWS};
use tracing::{info, warn};

/// A header cell that held a different value before insertion wrote over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwrittenHeader {
    pub column: usize,
    pub previous: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertReport {
    pub anchor: ColumnRef,
    pub written: Vec<ColumnRef>,
    pub overwritten: Vec<OverwrittenHeader>,
}

/// Write `new_names` into row 1, starting in the column right after `anchor`.
///
/// Nothing is shifted: whatever sits in those header cells is replaced. When
/// the anchor is missing the sheet is left untouched and `ColumnNotFound` is
/// returned. A region running past the last column is a write error, also
/// without touching the sheet.
pub fn insert_headers(
    sheet: &mut Sheet,
    anchor: &str,
    new_names: &[String],
) -> CoreResult<InsertReport> {
    let header = HeaderRow::read(sheet);
    let anchor = match resolve(&header, anchor) {
        Ok(anchor) => anchor,
        Err(err) => {
            warn!(anchor, "anchor column not found, headers not inserted");
            return Err(err);
        }
    };

    let last_col = anchor.index + new_names.len();
    if last_col > MAX_COLS {
        let first_outside = ColumnRef {
            name: String::new(),
            index: MAX_COLS + 1,
        };
        return Err(CoreError::write(
            first_outside.cell(1),
            SheetError::CellOutOfRange {
                row: 0,
                col: last_col - 1,
                max_rows: MAX_ROWS,
                max_cols: MAX_COLS,
            },
        ));
    }

    let mut written = Vec::with_capacity(new_names.len());
    let mut overwritten = Vec::new();

    for (offset, name) in new_names.iter().enumerate() {
        let column = ColumnRef {
            name: name.clone(),
            index: anchor.index + 1 + offset,
        };
        let addr = column.cell(1);
        let previous = sheet
            .value_at(0, column.index - 1)
            .map_err(|e| CoreError::read(&addr, e))?;
        if !previous.is_empty() && previous.to_string() != *name {
            warn!(cell = %addr, previous = %previous, new = %name, "overwriting existing header");
            overwritten.push(OverwrittenHeader {
                column: column.index,
                previous: previous.to_string(),
            });
        }
        sheet
            .set_cell(0, column.index - 1, CellValue::from(name))
            .map_err(|e| CoreError::write(&addr, e))?;
        written.push(column);
    }

    info!(anchor = %anchor.name, count = written.len(), "inserted headers");
    Ok(InsertReport {
        anchor,
        written,
        overwritten,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_inserts_after_anchor() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "b"], vec!["1", "2"]]);
        let report = insert_headers(&mut sheet, "a", &names(&["x", "y"])).unwrap();

        // b is overwritten in place, y extends the row
        let header = HeaderRow::read(&sheet);
        assert_eq!(header.names(), &["a", "x", "y"]);
        assert_eq!(report.anchor.index, 1);
        assert_eq!(report.written[1].index, 3);
        assert_eq!(
            report.overwritten,
            vec![OverwrittenHeader {
                column: 2,
                previous: "b".to_string()
            }]
        );
        // data rows untouched
        assert_eq!(sheet.row(1).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_anchor_leaves_sheet_unchanged() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "b"], vec!["1", "2"]]);
        let before = sheet.clone();

        let err = insert_headers(&mut sheet, "zzz", &names(&["x"])).unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_anchor_uses_leftmost_duplicate() {
        let mut sheet = Sheet::from_data(vec![vec!["k", "", "k"]]);
        insert_headers(&mut sheet, "k", &names(&["n"])).unwrap();
        assert_eq!(HeaderRow::read(&sheet).names(), &["k", "n", "k"]);
    }

    #[test]
    fn test_region_past_last_column_is_write_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(0, MAX_COLS - 2, "末列前").unwrap();
        let before = sheet.clone();

        let err = insert_headers(&mut sheet, "末列前", &names(&["a", "b"])).unwrap_err();

        assert!(matches!(
            &err,
            CoreError::Write { cell, source: SheetError::CellOutOfRange { .. } } if cell == "XFE1"
        ));
        assert!(!err.is_recoverable());
        // XFD1 must not be half-written
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_region_ending_on_last_column_fits() {
        let mut sheet = Sheet::new();
        sheet.set_cell(0, MAX_COLS - 2, "末列前").unwrap();

        let report = insert_headers(&mut sheet, "末列前", &names(&["a"])).unwrap();

        assert_eq!(report.written[0].letters(), "XFD");
        assert_eq!(sheet.get_a1("XFD1").unwrap(), &CellValue::from("a"));
    }

    #[test]
    fn test_rewriting_same_name_is_not_reported() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "x"]]);
        let report = insert_headers(&mut sheet, "a", &names(&["x"])).unwrap();
        assert!(report.overwritten.is_empty());
    }
}
