//! # sheetpivot-core
//!
//! Header-driven column enrichment and pivot summary for a single sheet.
//!
//! This crate provides:
//! - Header normalization, column resolution and header insertion
//! - Formula synthesis for derived columns
//! - Occupied range detection
//! - Pivot table specification and the run pipeline

/// Workflow configuration.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Sum and copy formula synthesis.
pub mod formula;
/// Header row operations.
pub mod header;
/// Pivot specification builder.
pub mod pivot;
/// Full enrichment run.
pub mod pipeline;
/// Data range detection.
pub mod range;

pub use config::{PivotConfig, WorkflowConfig};
pub use error::{CoreError, CoreResult};
pub use formula::{synthesize, synthesize_specs, FormulaSpec, SynthesisReport};
pub use header::{insert_headers, normalize_headers, resolve, ColumnRef, HeaderRow};
pub use pivot::{build_pivot_spec, PivotLayout, RowField};
pub use pipeline::{run, InsertOutcome, PivotOutcome, RunReport};
pub use range::{detect_range, DataRange};
