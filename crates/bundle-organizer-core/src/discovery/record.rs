use crate::registry::RecordType;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a discovered candidate holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Record(RecordType),
    /// A `supplementary` directory owned by the entity of its sibling files.
    Supplementary,
}

impl FileType {
    pub fn record_type(self) -> Option<RecordType> {
        match self {
            FileType::Record(record_type) => Some(record_type),
            FileType::Supplementary => None,
        }
    }

    /// Records of these types are only kept when their owner is known.
    pub fn requires_entity(self) -> bool {
        match self {
            FileType::Record(record_type) => record_type.is_per_entity(),
            FileType::Supplementary => true,
        }
    }

    pub fn is_legacy(self) -> bool {
        self.record_type().map(RecordType::is_legacy).unwrap_or(false)
    }

    pub fn is_aggregate(self) -> bool {
        self.record_type().map(RecordType::is_aggregate).unwrap_or(false)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Record(record_type) => record_type.fmt(f),
            FileType::Supplementary => f.write_str("supplementary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    Plain,
    /// Extracted from `archive`; `member` is the name inside it.
    Archive { archive: PathBuf, member: String },
}

/// One candidate source file (or supplementary directory).
///
/// `path` may point into the run's staging directory and is only valid
/// until that run ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_type: FileType,
    pub entity_id: Option<String>,
    pub origin: Origin,
}

impl FileRecord {
    pub fn plain(path: impl Into<PathBuf>, file_type: FileType, entity_id: Option<String>) -> Self {
        Self {
            path: path.into(),
            file_type,
            entity_id,
            origin: Origin::Plain,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.origin {
            Origin::Plain => self.path.display().to_string(),
            Origin::Archive { archive, member } => format!("{}::{}", archive.display(), member),
        }
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.path.file_name().map(Path::new)
    }
}
