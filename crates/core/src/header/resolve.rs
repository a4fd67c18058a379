use crate::error::{CoreError, CoreResult};
use sheetpivot_sheet::{column_index_to_letters, Sheet};
use tracing::debug;

/// Names of the header cells in row 1, left to right.
///
/// A `HeaderRow` is a snapshot: read it again after anything writes to row 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderRow {
    names: Vec<String>,
}

impl HeaderRow {
    /// Read the displayed text of every cell in row 1.
    pub fn read(sheet: &Sheet) -> Self {
        let names = sheet
            .row(0)
            .map(|cells| cells.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        Self { names }
    }

    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// 1-based position of the leftmost header equal to `name`.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name).map(|i| i + 1)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A header name together with its resolved 1-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: String,
    pub index: usize,
}

impl ColumnRef {
    /// Column letters, e.g. `C` for index 3.
    pub fn letters(&self) -> String {
        column_index_to_letters(self.index - 1)
    }

    /// A1 address of this column in a 1-based `row`.
    pub fn cell(&self, row: usize) -> String {
        format!("{}{row}", self.letters())
    }
}

/// Resolve `name` against `header`, failing with `ColumnNotFound`.
pub fn resolve(header: &HeaderRow, name: &str) -> CoreResult<ColumnRef> {
    let index = header
        .resolve(name)
        .ok_or_else(|| CoreError::column_not_found(name))?;
    debug!(column = name, index, "resolved column");
    Ok(ColumnRef {
        name: name.to_string(),
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetpivot_sheet::CellValue;

    #[test]
    fn test_duplicates_resolve_leftmost() {
        let header = HeaderRow::from_names(["a", "b", "X", "c", "d", "e", "X"]);
        assert_eq!(header.resolve("X"), Some(3));
        assert_eq!(resolve(&header, "X").unwrap().index, 3);
    }

    #[test]
    fn test_resolve_missing() {
        let header = HeaderRow::from_names(["a"]);
        assert_eq!(header.resolve("b"), None);
        assert!(matches!(
            resolve(&header, "b"),
            Err(CoreError::ColumnNotFound { name }) if name == "b"
        ));
    }

    #[test]
    fn test_exact_match_only() {
        let header = HeaderRow::from_names(["Amount "]);
        assert_eq!(header.resolve("Amount"), None);
        assert_eq!(header.resolve("amount "), None);
    }

    #[test]
    fn test_read_uses_display_text() {
        let sheet = Sheet::from_data(vec![vec![
            CellValue::from("Name"),
            CellValue::Float(2024.0),
            CellValue::Null,
        ]]);
        let header = HeaderRow::read(&sheet);
        assert_eq!(header.names(), &["Name", "2024", ""]);
        assert_eq!(header.resolve("2024"), Some(2));
    }

    #[test]
    fn test_read_empty_sheet() {
        assert!(HeaderRow::read(&Sheet::new()).is_empty());
    }

    #[test]
    fn test_column_ref_cells() {
        let col = ColumnRef {
            name: "x".to_string(),
            index: 28,
        };
        assert_eq!(col.letters(), "AB");
        assert_eq!(col.cell(2), "AB2");
    }
}
