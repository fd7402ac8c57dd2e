use super::walk::SUPPLEMENTARY_DIR;
use crate::classify::identify_type;
use crate::error::Error;
use crate::registry::RecordType;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// A classified member written out to the staging directory.
#[derive(Debug, Clone)]
pub struct ExtractedMember {
    pub path: PathBuf,
    pub member: String,
    pub record_type: RecordType,
}

/// A `supplementary` directory materialized from an archive.
#[derive(Debug, Clone)]
pub struct ExtractedDir {
    pub path: PathBuf,
    pub member: String,
}

#[derive(Debug, Default)]
pub struct Extracted {
    pub members: Vec<ExtractedMember>,
    pub supplementary_dirs: Vec<ExtractedDir>,
}

/// The `.../supplementary` prefix of a member path, if the member lives under one.
/// For files the final segment is not considered, so a file named
/// `supplementary` is not a directory.
fn supplementary_prefix(relative: &Path, is_dir: bool) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = relative.components().collect();
    let searchable = if is_dir {
        components.len()
    } else {
        components.len().saturating_sub(1)
    };

    let position = components
        .iter()
        .take(searchable)
        .position(|component| component.as_os_str() == SUPPLEMENTARY_DIR)?;
    Some(components.iter().take(position + 1).collect())
}

/// Extract the interesting members of `archive` under `destination`.
///
/// Only members that classify as a record type, or that sit under a
/// `supplementary` directory, are written out. Member names that would
/// escape `destination` are skipped.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<Extracted, Error> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;

    let mut extracted = Extracted::default();
    let mut supplementary: BTreeMap<PathBuf, String> = BTreeMap::new();

    for index in 0..zip.len() {
        let mut member = zip.by_index(index)?;
        let name = member.name().to_string();
        let Some(relative) = member.enclosed_name().map(Path::to_path_buf) else {
            warn!("Skipping unsafe member name '{}' in {}", name, archive.display());
            continue;
        };

        let is_dir = member.is_dir();
        let supplementary_dir = supplementary_prefix(&relative, is_dir);
        let record_type = match supplementary_dir {
            Some(_) => None,
            None if is_dir => continue,
            None => match identify_type(&relative) {
                Some(record_type) => Some(record_type),
                None => continue,
            },
        };

        let target = destination.join(&relative);
        if is_dir {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut member, &mut out)?;
        }
        debug!("Extracted {}::{}", archive.display(), name);

        if let Some(dir) = supplementary_dir {
            let member_name = format!("{}/", dir.to_string_lossy());
            supplementary.entry(destination.join(dir)).or_insert(member_name);
        } else if let Some(record_type) = record_type {
            extracted.members.push(ExtractedMember {
                path: target,
                member: name,
                record_type,
            });
        }
    }

    for (path, member) in supplementary {
        fs::create_dir_all(&path)?;
        extracted
            .supplementary_dirs
            .push(ExtractedDir { path, member });
    }

    Ok(extracted)
}
