use crate::error::{Result, SheetError};
use crate::pivot::{unique_cache_field_names, PivotTable, PivotTableOptions};
use crate::sheet::Sheet;
use indexmap::IndexMap;

/// Characters Excel refuses in worksheet names
const INVALID_SHEET_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];
const MAX_SHEET_NAME_LEN: usize = 31;

/// A book containing multiple sheets (preserves insertion order)
#[derive(Debug, Clone)]
pub struct Book {
    sheets: IndexMap<String, Sheet>,
    active_index: usize,
    pivot_tables: Vec<PivotTable>,
}

impl Book {
    /// Create a new empty book
    #[must_use]
    pub fn new() -> Self {
        Book {
            sheets: IndexMap::new(),
            active_index: 0,
            pivot_tables: Vec::new(),
        }
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Check if a sheet exists
    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Position of a sheet in the book
    #[must_use]
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.get_index_of(name)
    }

    // ===== Sheet Access =====

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Get a mutable sheet by name
    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Index of the sheet shown when the file is opened
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Get the active sheet
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get_index(self.active_index).map(|(_, sheet)| sheet)
    }

    /// Set the active sheet by index (0-based)
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(SheetError::SheetIndexOutOfBounds {
                index,
                count: self.sheets.len(),
            });
        }
        self.active_index = index;
        Ok(())
    }

    // ===== Sheet Management =====

    /// Add a sheet to the book
    pub fn add_sheet(&mut self, name: &str, sheet: Sheet) -> Result<()> {
        validate_sheet_name(name)?;
        if self.sheets.contains_key(name) {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }

        let mut sheet = sheet;
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    /// Create an empty sheet and return its index.
    ///
    /// When a sheet with this name already exists its index is returned and
    /// the book is left unchanged.
    pub fn new_sheet(&mut self, name: &str) -> Result<usize> {
        if let Some(index) = self.sheets.get_index_of(name) {
            return Ok(index);
        }
        self.add_sheet(name, Sheet::with_name(name))?;
        Ok(self.sheets.len() - 1)
    }

    // ===== Pivot Tables =====

    /// Register a pivot table to be embedded when the book is saved.
    ///
    /// The source header row is captured now; later edits to the source sheet
    /// do not change the registered cache fields. The destination area is
    /// taken as given.
    pub fn add_pivot_table(&mut self, options: PivotTableOptions) -> Result<()> {
        let source = self.get_sheet(&options.data_range.sheet)?;
        if !self.has_sheet(&options.pivot_table_range.sheet) {
            return Err(SheetError::SheetNotFound {
                name: options.pivot_table_range.sheet.clone(),
            });
        }

        let rect = options.data_range.rect;
        if rect.row_count() < 2 {
            return Err(SheetError::Pivot(format!(
                "data range {} needs a header row and at least one record",
                options.data_range
            )));
        }
        if options.data.is_empty() {
            return Err(SheetError::Pivot("no value fields given".to_string()));
        }

        let mut headers = Vec::with_capacity(rect.col_count());
        for col in rect.start_col..=rect.end_col {
            headers.push(source.value_at(rect.start_row - 1, col - 1)?.to_string());
        }

        let position = |field: &str| -> Result<usize> {
            headers.iter().position(|h| h == field).ok_or_else(|| {
                SheetError::Pivot(format!(
                    "field '{field}' is not a column of {}",
                    options.data_range
                ))
            })
        };
        let row_field_indices = options
            .rows
            .iter()
            .map(|f| position(&f.data))
            .collect::<Result<Vec<_>>>()?;
        let data_field_indices = options
            .data
            .iter()
            .map(|f| position(&f.data))
            .collect::<Result<Vec<_>>>()?;

        self.pivot_tables.push(PivotTable {
            cache_fields: unique_cache_field_names(&headers),
            options,
            row_field_indices,
            data_field_indices,
        });
        Ok(())
    }

    /// Pivot tables registered so far
    #[must_use]
    pub fn pivot_tables(&self) -> &[PivotTable] {
        &self.pivot_tables
    }

    /// Iterate over (name, sheet) pairs in order
    pub fn sheets(&self) -> impl Iterator<Item = (&String, &Sheet)> {
        self.sheets.iter()
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name.chars().count() > MAX_SHEET_NAME_LEN
        || name.contains(INVALID_SHEET_NAME_CHARS)
        || name.starts_with('\'')
        || name.ends_with('\'');
    if invalid {
        return Err(SheetError::InvalidSheetName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a1_notation::CellRect;
    use crate::pivot::{Aggregation, PivotDataField, PivotField, SheetRange};

    fn options(data: &str, rows: &[&str], values: &[&str]) -> PivotTableOptions {
        PivotTableOptions {
            name: None,
            data_range: SheetRange::parse(data).unwrap(),
            pivot_table_range: SheetRange::new("Pivot", CellRect::new(1, 1, 20, 10)),
            rows: rows
                .iter()
                .map(|r| PivotField {
                    data: (*r).to_string(),
                    default_subtotal: true,
                })
                .collect(),
            data: values
                .iter()
                .map(|v| PivotDataField {
                    data: (*v).to_string(),
                    name: format!("Sum of {v}"),
                    subtotal: Aggregation::Sum,
                })
                .collect(),
            row_grand_totals: true,
            col_grand_totals: true,
            show_drill: true,
            show_row_headers: true,
            show_col_headers: true,
            show_last_column: true,
            style_name: None,
        }
    }

    fn book() -> Book {
        let mut book = Book::new();
        book.add_sheet(
            "Data",
            Sheet::from_data(vec![vec!["Region", "Amount"], vec!["North", "10"]]),
        )
        .unwrap();
        book.new_sheet("Pivot").unwrap();
        book
    }

    #[test]
    fn test_new_sheet_returns_existing_index() {
        let mut book = book();
        assert_eq!(book.new_sheet("Pivot").unwrap(), 1);
        assert_eq!(book.new_sheet("Other").unwrap(), 2);
        assert_eq!(book.sheet_count(), 3);
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut book = Book::new();
        assert!(book.new_sheet("").is_err());
        assert!(book.new_sheet("a/b").is_err());
        assert!(book.new_sheet(&"x".repeat(32)).is_err());
        assert!(book.new_sheet("透视表1").is_ok());
    }

    #[test]
    fn test_set_active_sheet() {
        let mut book = book();
        book.set_active_sheet(1).unwrap();
        assert_eq!(book.active_sheet().unwrap().name(), "Pivot");
        assert!(matches!(
            book.set_active_sheet(5),
            Err(SheetError::SheetIndexOutOfBounds { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_add_pivot_table_captures_fields() {
        let mut book = book();
        book.add_pivot_table(options("Data!A1:B2", &["Region"], &["Amount"]))
            .unwrap();
        let pivot = &book.pivot_tables()[0];
        assert_eq!(pivot.cache_fields, vec!["Region", "Amount"]);
        assert_eq!(pivot.row_field_indices, vec![0]);
        assert_eq!(pivot.data_field_indices, vec![1]);
        assert_eq!(pivot.record_count(), 1);
    }

    #[test]
    fn test_add_pivot_table_rejects_unknown_field() {
        let mut book = book();
        let err = book
            .add_pivot_table(options("Data!A1:B2", &["Country"], &["Amount"]))
            .unwrap_err();
        assert!(matches!(err, SheetError::Pivot(_)));
        assert!(book.pivot_tables().is_empty());
    }

    #[test]
    fn test_add_pivot_table_rejects_missing_sheets() {
        let mut book = book();
        assert!(matches!(
            book.add_pivot_table(options("Nope!A1:B2", &[], &["Amount"])),
            Err(SheetError::SheetNotFound { .. })
        ));

        let mut opts = options("Data!A1:B2", &[], &["Amount"]);
        opts.pivot_table_range.sheet = "Missing".to_string();
        assert!(matches!(
            book.add_pivot_table(opts),
            Err(SheetError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_add_pivot_table_needs_records_and_values() {
        let mut book = book();
        assert!(book
            .add_pivot_table(options("Data!A1:B1", &[], &["Amount"]))
            .is_err());
        assert!(book
            .add_pivot_table(options("Data!A1:B2", &["Region"], &[]))
            .is_err());
    }
}
