//! Header row handling: normalization, name resolution and insertion.

mod insert;
mod normalize;
mod resolve;

pub use insert::{insert_headers, InsertReport, OverwrittenHeader};
pub use normalize::{normalize_headers, FilledHeader, NormalizeReport};
pub use resolve::{resolve, ColumnRef, HeaderRow};
