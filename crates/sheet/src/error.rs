use thiserror::Error;

/// Errors that can occur during sheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid cell notation: {0}")]
    InvalidCellNotation(String),

    #[error("Cell out of range: row {row}, col {col} (limit {max_rows} rows, {max_cols} cols)")]
    CellOutOfRange {
        row: usize,
        col: usize,
        max_rows: usize,
        max_cols: usize,
    },

    #[error("Invalid formula at {cell}: {reason}")]
    InvalidFormula { cell: String, reason: String },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Sheet index out of bounds: {index} (book has {count} sheets)")]
    SheetIndexOutOfBounds { index: usize, count: usize },

    #[error("Invalid sheet name: {name}")]
    InvalidSheetName { name: String },

    #[error("Pivot table error: {0}")]
    Pivot(String),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
