use super::record::{FileRecord, FileType, Origin};
use crate::error::Exclusion;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A `supplementary` directory whose owner is not known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldSupplementary {
    pub path: PathBuf,
    pub origin: Origin,
}

/// Promote held directories whose parent directory directly contains
/// accepted records that all name the same entity.
///
/// Siblings without an entity (aggregate or legacy files) neither vote for
/// nor against an owner.
pub fn associate(held: Vec<HeldSupplementary>, records: &[FileRecord]) -> Vec<FileRecord> {
    let mut promoted = Vec::new();

    for candidate in held {
        let Some(parent) = candidate.path.parent() else {
            continue;
        };

        let owners: BTreeSet<&str> = records
            .iter()
            .filter(|record| record.path.parent() == Some(parent))
            .filter_map(|record| record.entity_id.as_deref())
            .collect();

        let mut owners = owners.into_iter();
        match (owners.next(), owners.next()) {
            (Some(owner), None) => {
                debug!(
                    "Supplementary directory {} belongs to {}",
                    candidate.path.display(),
                    owner
                );
                promoted.push(FileRecord {
                    entity_id: Some(owner.to_string()),
                    path: candidate.path,
                    file_type: FileType::Supplementary,
                    origin: candidate.origin,
                });
            }
            _ => {
                warn!(
                    "{}",
                    Exclusion::UnattributedSupplementary {
                        path: candidate.path
                    }
                );
            }
        }
    }

    promoted
}
