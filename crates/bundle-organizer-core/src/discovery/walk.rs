use crate::classify::is_zip_archive;
use crate::error::Error;
use glob::Pattern;
use std::io;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::WalkDir;

pub const SUPPLEMENTARY_DIR: &str = "supplementary";

/// Everything under the input roots that discovery has to look at.
#[derive(Debug, Default)]
pub struct Targets {
    /// Files and `supplementary` directories, in traversal order.
    pub entries: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
}

impl Targets {
    pub fn len(&self) -> usize {
        self.entries.len() + self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn is_supplementary_dir(path: &Path) -> bool {
    path.file_name()
        .map(|name| name == SUPPLEMENTARY_DIR)
        .unwrap_or(false)
}

pub fn compile_patterns(ignore_globs: &[String]) -> Vec<Pattern> {
    ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Recursive traversal of every root. Does not descend into `supplementary`
/// directories (they move as a unit) or into anything an ignore pattern matches.
pub fn enumerate(roots: &[PathBuf], ignore_patterns: &[Pattern]) -> Result<Targets, Error> {
    let mut targets = Targets::default();

    for root in roots {
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::PermissionDenied)
                    {
                        error!("Access denied while walking {}: {}", root.display(), err);
                        continue;
                    }
                    return Err(err.into());
                }
            };

            let path = entry.path();
            let is_dir = entry.file_type().is_dir();

            if ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(path))
            {
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            if is_dir {
                if is_supplementary_dir(path) {
                    targets.entries.push(path.to_path_buf());
                    walker.skip_current_dir();
                }
            } else if entry.file_type().is_file() {
                if is_zip_archive(path) {
                    targets.archives.push(path.to_path_buf());
                } else {
                    targets.entries.push(path.to_path_buf());
                }
            }
        }
    }

    Ok(targets)
}
