//! The enrichment run: normalize, insert, synthesize, then pivot.

use crate::config::WorkflowConfig;
use crate::error::{CoreError, CoreResult};
use crate::formula::{synthesize, SynthesisReport};
use crate::header::{insert_headers, normalize_headers, InsertReport, NormalizeReport};
use crate::pivot::build_pivot_spec;
use crate::range::{detect_range, DataRange};
use sheetpivot_sheet::Book;
use tracing::{info, warn};

/// What happened to the header insertion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(InsertReport),
    /// The anchor column was not in the header row; nothing was written.
    AnchorNotFound(String),
}

/// What happened when the pivot table was handed to the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PivotOutcome {
    Added,
    /// The book refused the pivot table; the rest of the run stands.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotSheet {
    pub name: String,
    pub index: usize,
    /// False when a sheet with this name already existed
    pub created: bool,
}

/// Every observable event of one run, in step order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub source_sheet: String,
    pub normalized: NormalizeReport,
    pub insert: InsertOutcome,
    pub synthesis: SynthesisReport,
    pub pivot_sheet: PivotSheet,
    pub data_range: DataRange,
    pub pivot: PivotOutcome,
}

/// Run the whole workflow against `book`.
///
/// Missing columns are reported and skipped. A missing source sheet, a read
/// or write failure, or a sheet without data aborts the run; the book may
/// then hold partial edits and should not be saved.
pub fn run(book: &mut Book, config: &WorkflowConfig) -> CoreResult<RunReport> {
    let layout = config.pivot.layout()?;
    let source_name = config.source_sheet.as_str();

    let sheet = book
        .get_sheet_mut(source_name)
        .map_err(|_| CoreError::SheetNotFound(source_name.to_string()))?;

    let normalized = normalize_headers(sheet, config.header_scan_width)?;

    let insert = match insert_headers(sheet, &config.anchor_column, &config.new_headers) {
        Ok(report) => InsertOutcome::Inserted(report),
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "continuing without inserted headers");
            InsertOutcome::AnchorNotFound(config.anchor_column.clone())
        }
        Err(err) => return Err(err),
    };

    let synthesis = synthesize(sheet, &config.copy_columns, &config.sum_columns)?;

    let pivot_name = layout.destination.sheet.clone();
    let created = !book.has_sheet(&pivot_name);
    let index = book.new_sheet(&pivot_name)?;
    book.set_active_sheet(index)?;
    info!(sheet = %pivot_name, index, created, "pivot sheet ready");

    let data_range = detect_range(book.get_sheet(source_name)?)?;

    let options = build_pivot_spec(
        &data_range,
        &config.pivot.row_fields,
        &config.pivot.value_fields,
        &layout,
    );
    let pivot = match book.add_pivot_table(options) {
        Ok(()) => {
            info!(range = %data_range, destination = %layout.destination, "pivot table added");
            PivotOutcome::Added
        }
        Err(err) => {
            warn!(error = %err, "pivot table rejected");
            PivotOutcome::Rejected(err.to_string())
        }
    };

    Ok(RunReport {
        source_sheet: source_name.to_string(),
        normalized,
        insert,
        synthesis,
        pivot_sheet: PivotSheet {
            name: pivot_name,
            index,
            created,
        },
        data_range,
        pivot,
    })
}
