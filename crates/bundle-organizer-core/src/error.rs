use crate::registry::RecordType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Dataframe error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("No data in {}", .0.display())]
    NoData(PathBuf),

    #[error("Column '{column}' not found in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("Action {index} failed ({description}): {source}")]
    PlanExecution {
        index: usize,
        description: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

/// Why a candidate was left out of discovery.
///
/// These are local recoveries: they are logged and the run carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    #[error("{} does not fit the {record_type} schema: {reason}", .path.display())]
    StructuralMismatch {
        path: PathBuf,
        record_type: RecordType,
        reason: String,
    },

    #[error("{} holds {} entity ids ({}), expected one", .path.display(), .entity_ids.len(), .entity_ids.join(", "))]
    AmbiguousEntity {
        path: PathBuf,
        entity_ids: Vec<String>,
    },

    #[error("{} names entity '{entity_id}', which is not a plain directory name", .path.display())]
    InvalidEntityId { path: PathBuf, entity_id: String },

    #[error("supplementary directory {} has no single owner", .path.display())]
    UnattributedSupplementary { path: PathBuf },
}
