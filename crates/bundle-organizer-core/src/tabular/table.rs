use crate::error::Error;
use crate::registry::{ColumnSpec, ScalarType};
use polars::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dtype: ScalarType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: ScalarType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }

    /// Take the column's type from the hint, falling back to text.
    pub fn with_hint(name: &str, hint: &[ColumnSpec]) -> Self {
        let dtype = hint
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, dtype)| *dtype)
            .unwrap_or(ScalarType::Utf8);
        Self::new(name, dtype)
    }
}

pub type Schema = Vec<Field>;

/// Materialized tabular data backed by a polars `DataFrame`.
///
/// Cells are held as text so tables read from different files stack without
/// type conflicts. `schema` records the declared type each column is written
/// with.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Schema,
    frame: DataFrame,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.frame.equals_missing(&other.frame)
    }
}

impl Table {
    pub fn from_frame(frame: DataFrame, hint: &[ColumnSpec]) -> Result<Self, Error> {
        let columns = frame
            .get_columns()
            .iter()
            .map(|column| column.cast(&DataType::String))
            .collect::<PolarsResult<Vec<Column>>>()?;
        let schema = columns
            .iter()
            .map(|column| Field::with_hint(column.name().as_str(), hint))
            .collect();

        Ok(Self {
            schema,
            frame: DataFrame::new(columns)?,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<String>>> {
        let column = self.frame.column(name).ok()?;
        let values = column.as_materialized_series().str().ok()?;
        Some(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// The frame with numeric columns cast to their declared type.
    /// Cells that do not parse become null.
    pub fn typed_frame(&self) -> Result<DataFrame, Error> {
        let columns = self
            .frame
            .get_columns()
            .iter()
            .zip(&self.schema)
            .map(|(column, field)| match field.dtype {
                ScalarType::Int64 => column.cast(&DataType::Int64),
                ScalarType::Float64 => column.cast(&DataType::Float64),
                // text -> bool casts are not lossless
                ScalarType::Utf8 | ScalarType::Boolean => Ok(column.clone()),
            })
            .collect::<PolarsResult<Vec<Column>>>()?;
        Ok(DataFrame::new(columns)?)
    }

    /// Stack tables on the union of their columns, in first-seen column order.
    /// Columns a table lacks are filled with nulls.
    pub fn concat_diagonal(tables: impl IntoIterator<Item = Table>) -> Result<Table, Error> {
        let tables: Vec<Table> = tables.into_iter().collect();
        if tables.is_empty() {
            return Ok(Table {
                schema: Vec::new(),
                frame: DataFrame::empty(),
            });
        }

        let mut declared: Schema = Vec::new();
        for table in &tables {
            for field in &table.schema {
                if !declared.iter().any(|existing| existing.name == field.name) {
                    declared.push(field.clone());
                }
            }
        }

        let frames: Vec<LazyFrame> = tables.into_iter().map(|table| table.frame.lazy()).collect();
        let frame = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;

        let schema = frame
            .get_column_names()
            .iter()
            .map(|name| {
                declared
                    .iter()
                    .find(|field| field.name == name.as_str())
                    .cloned()
                    .unwrap_or_else(|| Field::new(name.as_str(), ScalarType::Utf8))
            })
            .collect();

        Ok(Table { schema, frame })
    }

    /// Drop rows whose key repeats an earlier row's key; the first occurrence wins.
    ///
    /// An empty key list compares whole rows. Key columns missing from the table
    /// compare as null.
    pub fn unique_by(self, columns: &[&str]) -> Result<Table, Error> {
        let present: Vec<PlSmallStr> = columns
            .iter()
            .filter(|name| self.frame.column(name).is_ok())
            .map(|name| PlSmallStr::from(*name))
            .collect();

        let Table { schema, frame } = self;
        let lazy = frame.lazy();
        let unique = if columns.is_empty() {
            lazy.unique_stable(None, UniqueKeepStrategy::First)
        } else if present.is_empty() {
            // every key is null, so every row repeats the first
            lazy.limit(1)
        } else {
            lazy.unique_stable(Some(present), UniqueKeepStrategy::First)
        };

        Ok(Table {
            schema,
            frame: unique.collect()?,
        })
    }
}
