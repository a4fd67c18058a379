//! Formula synthesis for derived columns.
//!
//! Formulas are emitted as text for the spreadsheet application to evaluate;
//! nothing is computed here.

use crate::error::{CoreError, CoreResult};
use crate::header::{resolve, ColumnRef, HeaderRow};
use indexmap::IndexMap;
use sheetpivot_sheet::Sheet;
use std::fmt;
use tracing::{info, warn};

/// A rule deriving one column from others, applied to every data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaSpec {
    /// `target = SUM(sources...)`, arguments in the given order
    Sum { target: String, sources: Vec<String> },
    /// `target = source`
    Copy { target: String, source: String },
}

impl FormulaSpec {
    pub fn target(&self) -> &str {
        match self {
            FormulaSpec::Sum { target, .. } | FormulaSpec::Copy { target, .. } => target,
        }
    }

    pub fn kind(&self) -> FormulaKind {
        match self {
            FormulaSpec::Sum { .. } => FormulaKind::Sum,
            FormulaSpec::Copy { .. } => FormulaKind::Copy,
        }
    }

    fn source_names(&self) -> Vec<&str> {
        match self {
            FormulaSpec::Sum { sources, .. } => sources.iter().map(String::as_str).collect(),
            FormulaSpec::Copy { source, .. } => vec![source.as_str()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
    Sum,
    Copy,
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaKind::Sum => write!(f, "sum"),
            FormulaKind::Copy => write!(f, "copy"),
        }
    }
}

/// Build the ordered spec list: sums first, then copies, each in map order.
pub fn specs_from_maps(
    copy_columns: &IndexMap<String, String>,
    sum_columns: &IndexMap<String, Vec<String>>,
) -> Vec<FormulaSpec> {
    let sums = sum_columns.iter().map(|(target, sources)| FormulaSpec::Sum {
        target: target.clone(),
        sources: sources.clone(),
    });
    let copies = copy_columns.iter().map(|(target, source)| FormulaSpec::Copy {
        target: target.clone(),
        source: source.clone(),
    });
    sums.chain(copies).collect()
}

/// `=SUM(A2,B2)`
pub fn sum_formula(cells: &[String]) -> String {
    format!("=SUM({})", cells.join(","))
}

/// `=C2`
pub fn copy_formula(cell: &str) -> String {
    format!("={cell}")
}

/// Why a target was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TargetNotFound,
    SourceNotFound(String),
    NoSources,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TargetNotFound => write!(f, "target column not found"),
            SkipReason::SourceNotFound(name) => write!(f, "source column '{name}' not found"),
            SkipReason::NoSources => write!(f, "no source columns given"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTarget {
    pub target: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFormula {
    pub target: ColumnRef,
    pub sources: Vec<ColumnRef>,
    pub kind: FormulaKind,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub applied: Vec<AppliedFormula>,
    pub skipped: Vec<SkippedTarget>,
}

/// Write sum and copy formulas for every data row.
///
/// Sum targets are processed before copy targets. See [`synthesize_specs`].
pub fn synthesize(
    sheet: &mut Sheet,
    copy_columns: &IndexMap<String, String>,
    sum_columns: &IndexMap<String, Vec<String>>,
) -> CoreResult<SynthesisReport> {
    synthesize_specs(sheet, &specs_from_maps(copy_columns, sum_columns))
}

/// Apply each spec to rows 2 through the last row present now.
///
/// Headers are read fresh from the sheet. A target or source that does not
/// resolve skips that spec only. A failed write aborts synthesis.
pub fn synthesize_specs(sheet: &mut Sheet, specs: &[FormulaSpec]) -> CoreResult<SynthesisReport> {
    let header = HeaderRow::read(sheet);
    // Single snapshot; rows appended while writing are not visited.
    let last_row = sheet.row_count();
    let mut report = SynthesisReport::default();

    for spec in specs {
        let (target, sources) = match resolve_spec(&header, spec) {
            Ok(resolved) => resolved,
            Err(reason) => {
                warn!(column = spec.target(), reason = %reason, "skipping formula target");
                report.skipped.push(SkippedTarget {
                    target: spec.target().to_string(),
                    reason,
                });
                continue;
            }
        };

        let mut rows = 0;
        for row in 2..=last_row {
            let cells: Vec<String> = sources.iter().map(|c| c.cell(row)).collect();
            let formula = match spec {
                FormulaSpec::Sum { .. } => sum_formula(&cells),
                FormulaSpec::Copy { .. } => copy_formula(&cells[0]),
            };
            let addr = target.cell(row);
            sheet
                .set_formula(&addr, &formula)
                .map_err(|e| CoreError::write(&addr, e))?;
            rows += 1;
        }

        info!(column = %target.name, kind = %spec.kind(), rows, "filled formula column");
        report.applied.push(AppliedFormula {
            target,
            sources,
            kind: spec.kind(),
            rows,
        });
    }

    Ok(report)
}

fn resolve_spec(
    header: &HeaderRow,
    spec: &FormulaSpec,
) -> Result<(ColumnRef, Vec<ColumnRef>), SkipReason> {
    let names = spec.source_names();
    if names.is_empty() {
        return Err(SkipReason::NoSources);
    }
    let target = resolve(header, spec.target()).map_err(|_| SkipReason::TargetNotFound)?;
    let sources = names
        .into_iter()
        .map(|name| resolve(header, name).map_err(|_| SkipReason::SourceNotFound(name.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((target, sources))
}
