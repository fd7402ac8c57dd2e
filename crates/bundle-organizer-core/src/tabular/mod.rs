//! Tabular access used by validation and merging.
//!
//! The pipeline never looks at what a row means. It only needs a file's
//! header, the distinct values of one column, and the ability to stack,
//! deduplicate and write whole tables.

mod frames;
mod table;

pub use frames::FrameTables;
pub use table::{Field, Schema, Table};

use crate::classify::DataFormat;
use crate::error::Error;
use crate::registry::ColumnSpec;
use std::collections::BTreeSet;
use std::path::Path;

pub trait TabularAccess: Send + Sync {
    /// Read the column layout without materializing rows.
    /// Returns `Error::NoData` for an empty file or one with no header.
    fn collect_schema(&self, path: &Path, hint: &[ColumnSpec]) -> Result<Schema, Error>;

    /// Distinct non-null values of one column.
    fn distinct_values(&self, path: &Path, column: &str) -> Result<BTreeSet<String>, Error>;

    fn scan(&self, path: &Path, hint: &[ColumnSpec]) -> Result<Table, Error>;

    fn write(&self, table: &Table, path: &Path, format: DataFormat) -> Result<(), Error>;
}
