use crate::registry::RecordType;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// On-disk format of a tabular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Csv,
    Parquet,
}

impl DataFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Match a file or archive member name against the type registry.
///
/// Only the final path segment is considered, with its extension stripped,
/// compared case-insensitively. The file content is never read.
pub fn identify_type(name: impl AsRef<Path>) -> Option<RecordType> {
    let stem = name.as_ref().file_stem()?.to_str()?.to_lowercase();
    RecordType::all().find(|record_type| record_type.tag() == stem)
}

pub fn identify_format(path: impl AsRef<Path>) -> Option<DataFormat> {
    let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "csv" => Some(DataFormat::Csv),
        "parquet" => Some(DataFormat::Parquet),
        _ => None,
    }
}

pub fn is_zip_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
