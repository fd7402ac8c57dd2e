use super::{Field, Schema, Table, TabularAccess};
use crate::classify::{identify_format, DataFormat};
use crate::error::Error;
use crate::registry::ColumnSpec;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;
use tracing::trace;

/// `TabularAccess` over CSV and Parquet files, read lazily through polars.
///
/// CSV cells are read as text without type inference, so ids such as `007`
/// keep their leading zeros. Empty cells read as null.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameTables;

impl FrameTables {
    pub fn new() -> Self {
        Self
    }

    fn lazy(path: &Path) -> Result<LazyFrame, Error> {
        if fs::metadata(path)?.len() == 0 {
            return Err(Error::NoData(path.to_path_buf()));
        }

        match identify_format(path) {
            Some(DataFormat::Csv) => Ok(LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .finish()?),
            Some(DataFormat::Parquet) => Ok(LazyFrame::scan_parquet(path, ScanArgsParquet::default())?),
            None => Err(Error::UnsupportedFormat(format!(
                "cannot read {}",
                path.display()
            ))),
        }
    }

    /// Open a file and read only its column names.
    fn header(path: &Path) -> Result<(LazyFrame, Vec<String>), Error> {
        let mut frame = Self::lazy(path)?;
        let names: Vec<String> = frame
            .collect_schema()?
            .iter_names()
            .map(|name| name.to_string())
            .collect();
        if names.is_empty() {
            return Err(Error::NoData(path.to_path_buf()));
        }
        Ok((frame, names))
    }
}

impl TabularAccess for FrameTables {
    fn collect_schema(&self, path: &Path, hint: &[ColumnSpec]) -> Result<Schema, Error> {
        let (_, names) = Self::header(path)?;
        Ok(names.iter().map(|name| Field::with_hint(name, hint)).collect())
    }

    fn distinct_values(&self, path: &Path, column: &str) -> Result<BTreeSet<String>, Error> {
        let (frame, names) = Self::header(path)?;
        if !names.iter().any(|name| name == column) {
            return Err(Error::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }

        let distinct = frame
            .select([col(column).cast(DataType::String).drop_nulls().unique()])
            .collect()?;
        let values = distinct
            .column(column)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .flatten()
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        Ok(values)
    }

    fn scan(&self, path: &Path, hint: &[ColumnSpec]) -> Result<Table, Error> {
        let frame = Self::lazy(path)?.collect()?;
        if frame.width() == 0 {
            return Err(Error::NoData(path.to_path_buf()));
        }
        trace!("Read {} rows from {}", frame.height(), path.display());

        Table::from_frame(frame, hint)
    }

    fn write(&self, table: &Table, path: &Path, format: DataFormat) -> Result<(), Error> {
        let mut file = File::create(path)?;
        match format {
            DataFormat::Csv => {
                let mut frame = table.frame().clone();
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut frame)?;
            }
            DataFormat::Parquet => {
                let mut frame = table.typed_frame()?;
                ParquetWriter::new(&mut file).finish(&mut frame)?;
            }
        }
        Ok(())
    }
}
