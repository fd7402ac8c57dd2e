use crate::classify::DataFormat;
use crate::discovery::FileRecord;
use crate::error::Error;
use crate::registry::RecordType;
use crate::tabular::{Table, TabularAccess};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A file an action reads from, with the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub name: String,
}

impl Source {
    pub fn plain(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            name: path.display().to_string(),
        }
    }
}

impl From<&FileRecord> for Source {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            name: record.display_name(),
        }
    }
}

/// One step of a plan. Pure data: `describe` never touches the filesystem
/// beyond reading metadata, `execute` performs the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    MoveFile {
        source: Source,
        destination: PathBuf,
        ignore_duplicates: bool,
    },
    CopyFile {
        source: Source,
        destination: PathBuf,
        ignore_duplicates: bool,
    },
    MergeFiles {
        record_type: RecordType,
        sources: Vec<Source>,
        destination: PathBuf,
        unique_by: Vec<String>,
        format: DataFormat,
    },
    DeleteFile {
        source: Source,
    },
    IgnoreFile {
        source: Source,
    },
}

impl PlannedAction {
    pub fn describe(&self) -> String {
        match self {
            PlannedAction::MoveFile {
                source,
                destination,
                ignore_duplicates,
            } => {
                if !ignore_duplicates && destination_is_current(&source.path, destination) {
                    format!("Skipping older {}", source.name)
                } else {
                    format!("Moving {} to {}", source.name, destination.display())
                }
            }
            PlannedAction::CopyFile {
                source,
                destination,
                ignore_duplicates,
            } => {
                if !ignore_duplicates && destination_is_current(&source.path, destination) {
                    format!("Skipping older {}", source.name)
                } else {
                    format!("Copying {} to {}", source.name, destination.display())
                }
            }
            PlannedAction::MergeFiles {
                record_type,
                sources,
                destination,
                ..
            } => {
                let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
                format!(
                    "Merging {} {} files to {}: {}",
                    sources.len(),
                    record_type,
                    destination.display(),
                    names.join(", ")
                )
            }
            PlannedAction::DeleteFile { source } => format!("Deleting {}", source.name),
            PlannedAction::IgnoreFile { source } => format!("Ignoring legacy file {}", source.name),
        }
    }

    pub fn execute(&self, tables: &dyn TabularAccess) -> Result<(), Error> {
        match self {
            PlannedAction::MoveFile {
                source,
                destination,
                ignore_duplicates,
            } => {
                if !ignore_duplicates && destination_is_current(&source.path, destination) {
                    // already captured downstream
                    remove_path(&source.path)?;
                } else {
                    create_parent(destination)?;
                    move_path(&source.path, destination)?;
                }
            }
            PlannedAction::CopyFile {
                source,
                destination,
                ignore_duplicates,
            } => {
                if *ignore_duplicates || !destination_is_current(&source.path, destination) {
                    create_parent(destination)?;
                    copy_path(&source.path, destination)?;
                }
            }
            PlannedAction::MergeFiles {
                record_type,
                sources,
                destination,
                unique_by,
                format,
            } => {
                let mut inputs = Vec::with_capacity(sources.len());
                for source in sources {
                    match tables.scan(&source.path, record_type.schema()) {
                        Ok(table) => inputs.push(table),
                        Err(Error::NoData(_)) => debug!("Nothing to merge from {}", source.name),
                        Err(e) => return Err(e),
                    }
                }

                if inputs.is_empty() {
                    debug!("No data to merge into {}", destination.display());
                    return Ok(());
                }

                let keys: Vec<&str> = unique_by.iter().map(String::as_str).collect();
                let merged = Table::concat_diagonal(inputs)?.unique_by(&keys)?;
                debug!(
                    "Writing {} unique rows to {}",
                    merged.height(),
                    destination.display()
                );

                create_parent(destination)?;
                tables.write(&merged, destination, *format)?;
            }
            PlannedAction::DeleteFile { source } => remove_path(&source.path)?,
            PlannedAction::IgnoreFile { .. } => {}
        }
        Ok(())
    }
}

/// True when `destination` exists and `source` is not strictly newer.
fn destination_is_current(source: &Path, destination: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    match (modified(source), modified(destination)) {
        (Some(source_time), Some(destination_time)) => source_time <= destination_time,
        (None, Some(_)) => destination.exists(),
        _ => false,
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn copy_path(source: &Path, destination: &Path) -> io::Result<()> {
    if source.is_dir() {
        if destination.exists() {
            remove_path(destination)?;
        }
        copy_dir(source, destination)
    } else {
        fs::copy(source, destination).map(|_| ())
    }
}

fn copy_dir(source: &Path, destination: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Rename, falling back to copy + remove (staging and output may sit on
/// different filesystems).
fn move_path(source: &Path, destination: &Path) -> io::Result<()> {
    if destination.is_dir() || (source.is_dir() && destination.exists()) {
        remove_path(destination)?;
    }
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                "Rename {} -> {} failed ({}), copying instead",
                source.display(),
                destination.display(),
                e
            );
            copy_path(source, destination)?;
            remove_path(source)
        }
    }
}
