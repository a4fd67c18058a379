//! Pivot table specification assembly.

use crate::range::DataRange;
use serde::{Deserialize, Serialize};
use sheetpivot_sheet::{
    Aggregation, CellRect, PivotDataField, PivotField, PivotTableOptions, SheetRange,
};

/// Destination area used when none is configured
pub const DEFAULT_PIVOT_SHEET: &str = "透视表1";
pub const DEFAULT_PIVOT_AREA: &str = "A1:AX5538";
/// Caption prefix for value fields, "sum of"
pub const DEFAULT_VALUE_PREFIX: &str = "求和项：";

/// A row grouping column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowField {
    pub name: String,
    #[serde(default = "default_subtotal")]
    pub subtotal: bool,
}

fn default_subtotal() -> bool {
    true
}

impl RowField {
    pub fn new(name: &str, subtotal: bool) -> Self {
        Self {
            name: name.to_string(),
            subtotal,
        }
    }
}

/// Placement and display flags for the pivot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotLayout {
    pub destination: SheetRange,
    pub value_name_prefix: String,
    pub row_grand_totals: bool,
    pub col_grand_totals: bool,
    pub show_drill: bool,
    pub show_row_headers: bool,
    pub show_col_headers: bool,
    pub show_last_column: bool,
}

impl PivotLayout {
    /// Layout with the fixed display flags, placed at `destination`.
    pub fn new(destination: SheetRange, value_name_prefix: &str) -> Self {
        Self {
            destination,
            value_name_prefix: value_name_prefix.to_string(),
            row_grand_totals: true,
            col_grand_totals: true,
            show_drill: true,
            show_row_headers: true,
            show_col_headers: true,
            show_last_column: true,
        }
    }
}

impl Default for PivotLayout {
    fn default() -> Self {
        Self::new(
            SheetRange::new(DEFAULT_PIVOT_SHEET, CellRect::new(1, 1, 5538, 50)),
            DEFAULT_VALUE_PREFIX,
        )
    }
}

/// Assemble the pivot description over `range`.
///
/// Every value field is a sum. The destination is used as given, even when
/// it is too small for the result.
pub fn build_pivot_spec(
    range: &DataRange,
    row_fields: &[RowField],
    value_fields: &[String],
    layout: &PivotLayout,
) -> PivotTableOptions {
    PivotTableOptions {
        name: None,
        data_range: range.to_sheet_range(),
        pivot_table_range: layout.destination.clone(),
        rows: row_fields
            .iter()
            .map(|field| PivotField {
                data: field.name.clone(),
                default_subtotal: field.subtotal,
            })
            .collect(),
        data: value_fields
            .iter()
            .map(|column| PivotDataField {
                data: column.clone(),
                name: format!("{}{column}", layout.value_name_prefix),
                subtotal: Aggregation::Sum,
            })
            .collect(),
        row_grand_totals: layout.row_grand_totals,
        col_grand_totals: layout.col_grand_totals,
        show_drill: layout.show_drill,
        show_row_headers: layout.show_row_headers,
        show_col_headers: layout.show_col_headers,
        show_last_column: layout.show_last_column,
        style_name: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DataRange {
        DataRange {
            sheet: "Sheet1".to_string(),
            start_row: 1,
            start_col: 1,
            end_row: 6,
            end_col: 11,
        }
    }

    #[test]
    fn test_build_pivot_spec() {
        let rows = vec![RowField::new("评估分类", true), RowField::new("ABC 类", false)];
        let values = vec!["1年内".to_string(), "1到2".to_string()];
        let spec = build_pivot_spec(&range(), &rows, &values, &PivotLayout::default());

        assert_eq!(spec.data_range.to_string(), "Sheet1!A1:K6");
        assert_eq!(spec.pivot_table_range.to_string(), "透视表1!A1:AX5538");
        assert_eq!(spec.rows.len(), 2);
        assert!(spec.rows[0].default_subtotal);
        assert!(!spec.rows[1].default_subtotal);
        assert_eq!(spec.data[0].name, "求和项：1年内");
        assert_eq!(spec.data[1].data, "1到2");
        assert!(spec.data.iter().all(|d| d.subtotal == Aggregation::Sum));
    }

    #[test]
    fn test_display_flags_are_fixed() {
        let spec = build_pivot_spec(&range(), &[], &["x".to_string()], &PivotLayout::default());
        assert!(spec.row_grand_totals);
        assert!(spec.col_grand_totals);
        assert!(spec.show_drill);
        assert!(spec.show_row_headers);
        assert!(spec.show_col_headers);
        assert!(spec.show_last_column);
    }

    #[test]
    fn test_custom_prefix() {
        let layout = PivotLayout::new(
            SheetRange::parse("Summary!B2:F40").unwrap(),
            "Sum of ",
        );
        let spec = build_pivot_spec(&range(), &[], &["Total".to_string()], &layout);
        assert_eq!(spec.data[0].name, "Sum of Total");
        assert_eq!(spec.pivot_table_range.rect, CellRect::new(2, 2, 40, 6));
    }

    #[test]
    fn test_row_field_subtotal_defaults_on() {
        let field: RowField = serde_json::from_str(r#"{"name":"Region"}"#).unwrap();
        assert!(field.subtotal);
    }
}
