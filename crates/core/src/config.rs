//! Workflow configuration.
//!
//! Defaults describe the receivables aging workflow: the age-bucket amount
//! columns are rolled up into yearly buckets and summarised per assessment
//! category.

use crate::error::{CoreError, CoreResult};
use crate::pivot::{
    PivotLayout, RowField, DEFAULT_PIVOT_AREA, DEFAULT_PIVOT_SHEET, DEFAULT_VALUE_PREFIX,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sheetpivot_sheet::{CellRect, SheetRange};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Number of header columns inspected by normalization
pub const DEFAULT_HEADER_SCAN_WIDTH: usize = 45;

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub source_sheet: String,
    pub header_scan_width: usize,
    pub anchor_column: String,
    pub new_headers: Vec<String>,
    /// target -> summed sources
    pub sum_columns: IndexMap<String, Vec<String>>,
    /// target -> copied source
    pub copy_columns: IndexMap<String, String>,
    pub pivot: PivotConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    pub sheet_name: String,
    /// A1 range on `sheet_name`
    pub destination: String,
    pub row_fields: Vec<RowField>,
    pub value_fields: Vec<String>,
    pub value_name_prefix: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let mut sum_columns = IndexMap::new();
        sum_columns.insert(
            "1年内".to_string(),
            strings(&["180天内金额", "181-365天金额"]),
        );

        let mut copy_columns = IndexMap::new();
        for (target, source) in [
            ("1到2", "366-730天金额"),
            ("2到3", "731-1095天金额"),
            ("3到4", "1096-1460天金额"),
            ("4到5", "1461-1825天金额"),
            ("5以上", "大于等于1826天金额"),
        ] {
            copy_columns.insert(target.to_string(), source.to_string());
        }

        Self {
            source_sheet: "Sheet1".to_string(),
            header_scan_width: DEFAULT_HEADER_SCAN_WIDTH,
            anchor_column: "大于等于1826天金额".to_string(),
            new_headers: strings(&["1年内", "1到2", "2到3", "3到4", "4到5", "5以上"]),
            sum_columns,
            copy_columns,
            pivot: PivotConfig::default(),
        }
    }
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_PIVOT_SHEET.to_string(),
            destination: DEFAULT_PIVOT_AREA.to_string(),
            row_fields: vec![
                RowField::new("评估分类", true),
                RowField::new("ABC 类", true),
            ],
            value_fields: strings(&["1年内", "1到2", "2到3", "3到4", "4到5", "5以上"]),
            value_name_prefix: DEFAULT_VALUE_PREFIX.to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Load a JSON configuration; missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.source_sheet.trim().is_empty() {
            return Err(CoreError::Config("source_sheet is empty".to_string()));
        }
        if self.header_scan_width == 0 {
            return Err(CoreError::Config(
                "header_scan_width must be at least 1".to_string(),
            ));
        }
        if let Some((target, _)) = self.sum_columns.iter().find(|(_, s)| s.is_empty()) {
            return Err(CoreError::Config(format!(
                "sum column '{target}' has no source columns"
            )));
        }
        if self.pivot.value_fields.is_empty() {
            return Err(CoreError::Config(
                "pivot.value_fields must name at least one column".to_string(),
            ));
        }
        self.pivot.layout().map(|_| ())
    }
}

impl PivotConfig {
    /// Destination and display layout for the pivot table.
    pub fn layout(&self) -> CoreResult<PivotLayout> {
        let rect = CellRect::from_a1_range(&self.destination).map_err(|e| {
            CoreError::Config(format!(
                "pivot.destination '{}' is not an A1 range: {e}",
                self.destination
            ))
        })?;
        Ok(PivotLayout::new(
            SheetRange::new(&self.sheet_name, rect),
            &self.value_name_prefix,
        ))
    }
}
