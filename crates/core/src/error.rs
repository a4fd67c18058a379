//! Error types for sheetpivot.

use sheetpivot_sheet::SheetError;
use thiserror::Error;

/// Result type for sheetpivot operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while enriching a sheet.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cell or row could not be read. Fatal for the run.
    #[error("Read error at {cell}: {source}")]
    Read { cell: String, source: SheetError },

    /// A named column or anchor is missing. Recoverable.
    #[error("Column not found: '{name}'")]
    ColumnNotFound { name: String },

    /// The sheet has no rows, or no non-empty cell.
    #[error("Sheet '{sheet}' has no data")]
    EmptySheet { sheet: String },

    /// A cell or formula could not be written.
    #[error("Write error at {cell}: {source}")]
    Write { cell: String, source: SheetError },

    /// The configured source sheet does not exist.
    #[error("Sheet not found: '{0}'")]
    SheetNotFound(String),

    /// The workflow configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The book rejected a workbook-level change (sheet creation, activation).
    #[error("Workbook error: {0}")]
    Book(#[from] SheetError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a read error for `cell`.
    pub fn read(cell: impl Into<String>, source: SheetError) -> Self {
        Self::Read {
            cell: cell.into(),
            source,
        }
    }

    /// Create a write error for `cell`.
    pub fn write(cell: impl Into<String>, source: SheetError) -> Self {
        Self::Write {
            cell: cell.into(),
            source,
        }
    }

    /// Create a column-not-found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Whether the caller may report this error and carry on with sibling
    /// operations.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ColumnNotFound { .. })
    }
}
