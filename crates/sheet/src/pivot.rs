//! Declarative pivot table description handed to [`Book::add_pivot_table`].
//!
//! [`Book::add_pivot_table`]: crate::Book::add_pivot_table

use crate::a1_notation::CellRect;
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangle on a named sheet, rendered as `Sheet1!A1:K6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub rect: CellRect,
}

impl SheetRange {
    #[must_use]
    pub fn new(sheet: &str, rect: CellRect) -> Self {
        Self {
            sheet: sheet.to_string(),
            rect,
        }
    }

    /// Parse `Sheet1!A1:K6` or `'My Sheet'!A1:K6`.
    pub fn parse(reference: &str) -> Result<Self> {
        let (sheet, range) = reference
            .rsplit_once('!')
            .ok_or_else(|| SheetError::InvalidCellNotation(reference.to_string()))?;
        let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(quoted) => quoted.replace("''", "'"),
            None => sheet.to_string(),
        };
        if sheet.is_empty() {
            return Err(SheetError::InvalidCellNotation(reference.to_string()));
        }
        Ok(Self {
            sheet,
            rect: CellRect::from_a1_range(range)?,
        })
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = self
            .sheet
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_');
        if plain {
            write!(f, "{}!{}", self.sheet, self.rect.to_a1_range())
        } else {
            write!(
                f,
                "'{}'!{}",
                self.sheet.replace('\'', "''"),
                self.rect.to_a1_range()
            )
        }
    }
}

/// Aggregation applied to a value field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
}

impl Aggregation {
    /// `dataField@subtotal` attribute value
    #[must_use]
    pub fn as_xml(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
        }
    }
}

/// Row grouping field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotField {
    /// Header name of the source column
    pub data: String,
    pub default_subtotal: bool,
}

/// Aggregated value field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotDataField {
    /// Header name of the source column
    pub data: String,
    /// Caption shown in the pivot table, e.g. "求和项：1年内"
    pub name: String,
    pub subtotal: Aggregation,
}

/// Everything needed to embed one pivot table in a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTableOptions {
    pub name: Option<String>,
    pub data_range: SheetRange,
    pub pivot_table_range: SheetRange,
    pub rows: Vec<PivotField>,
    pub data: Vec<PivotDataField>,
    pub row_grand_totals: bool,
    pub col_grand_totals: bool,
    pub show_drill: bool,
    pub show_row_headers: bool,
    pub show_col_headers: bool,
    pub show_last_column: bool,
    pub style_name: Option<String>,
}

/// A pivot table accepted by a book, with the cache field names captured
/// from the source header row at registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub options: PivotTableOptions,
    pub cache_fields: Vec<String>,
    /// Position of each row field within `cache_fields`
    pub row_field_indices: Vec<usize>,
    /// Position of each data field within `cache_fields`
    pub data_field_indices: Vec<usize>,
}

impl PivotTable {
    /// Number of records below the header row
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.options.data_range.rect.row_count().saturating_sub(1)
    }
}

/// Cache field names must be unique and non-empty inside a pivot cache.
pub(crate) fn unique_cache_field_names(headers: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Column{}", idx + 1)
        } else {
            header.clone()
        };
        let mut candidate = base.clone();
        let mut suffix = 2;
        while seen.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_range_display() {
        let range = SheetRange::new("Sheet1", CellRect::new(1, 1, 6, 11));
        assert_eq!(range.to_string(), "Sheet1!A1:K6");

        let cjk = SheetRange::new("透视表1", CellRect::new(1, 1, 5538, 50));
        assert_eq!(cjk.to_string(), "透视表1!A1:AX5538");

        let spaced = SheetRange::new("My Data", CellRect::new(1, 1, 2, 2));
        assert_eq!(spaced.to_string(), "'My Data'!A1:B2");
    }

    #[test]
    fn test_sheet_range_parse() {
        let range = SheetRange::parse("'It''s'!A1:B3").unwrap();
        assert_eq!(range.sheet, "It's");
        assert_eq!(range.rect, CellRect::new(1, 1, 3, 2));

        assert!(SheetRange::parse("A1:B3").is_err());
        assert!(SheetRange::parse("!A1:B3").is_err());
    }

    #[test]
    fn test_unique_cache_field_names() {
        let headers = vec![
            "a".to_string(),
            String::new(),
            "a".to_string(),
            "a".to_string(),
        ];
        assert_eq!(
            unique_cache_field_names(&headers),
            vec!["a", "Column2", "a2", "a3"]
        );
    }
}
