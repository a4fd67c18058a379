use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a cell value in a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Excel serial date/time; written back with a date number format.
    DateTime(f64),
    String(String),
    /// Formula source text, always stored with a leading `=`.
    Formula(String),
}

impl CellValue {
    /// Create a formula cell value, normalising the leading `=`.
    #[must_use]
    pub fn formula<S: Into<String>>(source: S) -> Self {
        let source = source.into();
        let trimmed = source.trim();
        if trimmed.starts_with('=') {
            CellValue::Formula(trimmed.to_string())
        } else {
            CellValue::Formula(format!("={trimmed}"))
        }
    }

    /// A cell is empty when it holds nothing or the empty string.
    ///
    /// Whitespace-only text is *not* empty here; use [`CellValue::is_blank`]
    /// to treat it as such.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Formula source if this is a formula cell
    #[must_use]
    pub fn formula_source(&self) -> Option<&str> {
        match self {
            CellValue::Formula(source) => Some(source),
            _ => None,
        }
    }

}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) | CellValue::DateTime(fl) => write!(f, "{fl}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Formula(source) => write!(f, "{source}"),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::String(s.clone())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}
