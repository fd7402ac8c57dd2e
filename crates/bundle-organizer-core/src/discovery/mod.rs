//! Turns input directory trees and zip bundles into candidate [`FileRecord`]s.
//!
//! Phases, in order:
//! 1. enumerate entries and archives under every input root
//! 2. classify and validate plain files, holding `supplementary` dirs aside
//! 3. extract archives into staging and run the members through step 2
//! 4. attach held `supplementary` dirs to the entity of their sibling files
//! 5. keep one record per (type, entity), first seen wins; with
//!    `keep_duplicates` only supplementary dirs are collapsed

pub mod archive;
pub mod record;
pub mod supplementary;
pub mod walk;

pub use record::{FileRecord, FileType, Origin};

use crate::classify::identify_type;
use crate::config::non_overlapping_directories;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::registry::RecordType;
use crate::validation::{ValidationResult, ValidationStrategies};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use supplementary::HeldSupplementary;
use tracing::{debug, info, warn};

pub struct FileDiscovery {
    roots: Vec<PathBuf>,
    strategies: ValidationStrategies,
    staging: PathBuf,
    ignore_patterns: Vec<String>,
    keep_duplicates: bool,
}

impl FileDiscovery {
    /// `staging` receives extracted archive members; the caller owns its lifetime.
    pub fn new(roots: Vec<PathBuf>, strategies: ValidationStrategies, staging: &Path) -> Self {
        Self {
            roots,
            strategies,
            staging: staging.to_path_buf(),
            ignore_patterns: Vec::new(),
            keep_duplicates: false,
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Keep every usable record, owned or not. Used when everything is merged
    /// per type and merge uniqueness takes care of overlaps.
    ///
    /// Supplementary dirs are still kept to one per entity: they are copied,
    /// not merged, and several of them would land on the same destination.
    pub fn keep_duplicates(mut self) -> Self {
        self.keep_duplicates = true;
        self
    }

    pub fn discover(&self, reporter: &dyn ProgressReporter) -> Result<Vec<FileRecord>, Error> {
        let start = Instant::now();
        let roots = non_overlapping_directories(self.roots.clone());
        info!("Discovering files in {:?}", roots);

        // Phase 1: enumerate
        let patterns = walk::compile_patterns(&self.ignore_patterns);
        let targets = walk::enumerate(&roots, &patterns)?;
        let total = targets.len();
        reporter.on_discovery_start(total);
        let mut current = 0;

        // Phase 2: plain entries
        let mut records: Vec<FileRecord> = Vec::new();
        let mut held: Vec<HeldSupplementary> = Vec::new();
        for path in &targets.entries {
            current += 1;
            if path.is_dir() && walk::is_supplementary_dir(path) {
                held.push(HeldSupplementary {
                    path: path.clone(),
                    origin: Origin::Plain,
                });
            } else if let Some(record_type) = identify_type(path) {
                if let Some(record) = self.validate(path.clone(), record_type, Origin::Plain) {
                    records.push(record);
                }
            }
            reporter.on_discovery_progress(current, total, path);
        }

        // Phase 3: archives, each into its own staging subdirectory
        for (index, archive_path) in targets.archives.iter().enumerate() {
            current += 1;
            let destination = self.staging.join(format!("{:04}", index));
            match archive::extract_archive(archive_path, &destination) {
                Ok(extracted) => {
                    for member in extracted.members {
                        let origin = Origin::Archive {
                            archive: archive_path.clone(),
                            member: member.member,
                        };
                        if let Some(record) = self.validate(member.path, member.record_type, origin)
                        {
                            records.push(record);
                        }
                    }
                    held.extend(extracted.supplementary_dirs.into_iter().map(|dir| {
                        HeldSupplementary {
                            path: dir.path,
                            origin: Origin::Archive {
                                archive: archive_path.clone(),
                                member: dir.member,
                            },
                        }
                    }));
                }
                Err(e) => warn!("Skipping archive {}: {}", archive_path.display(), e),
            }
            reporter.on_discovery_progress(current, total, archive_path);
        }

        // Phase 4: supplementary ownership
        let promoted = supplementary::associate(held, &records);
        records.extend(promoted);

        // Phase 5: one per (type, entity)
        let records = if self.keep_duplicates {
            dedupe_supplementary(records)
        } else {
            dedupe(records)
        };

        let duration = start.elapsed();
        info!(
            "Discovered {} usable records in {:.2}s",
            records.len(),
            duration.as_secs_f64()
        );
        reporter.on_discovery_complete(records.len(), duration.as_secs_f64());

        Ok(records)
    }

    fn validate(&self, path: PathBuf, record_type: RecordType, origin: Origin) -> Option<FileRecord> {
        match self.strategies.validate(record_type, &path) {
            ValidationResult::Usable { entity_id } => Some(FileRecord {
                path,
                file_type: FileType::Record(record_type),
                entity_id,
                origin,
            }),
            ValidationResult::Rejected(exclusion) => {
                warn!("Excluding {}", exclusion);
                None
            }
        }
    }
}

/// First-seen wins per (type, entity). Aggregate and legacy records pass
/// through untouched; records that need an owner and have none are dropped.
pub fn dedupe(records: Vec<FileRecord>) -> Vec<FileRecord> {
    dedupe_matching(records, |_| true)
}

/// [`dedupe`] applied to supplementary dirs only; every other record passes
/// through.
pub fn dedupe_supplementary(records: Vec<FileRecord>) -> Vec<FileRecord> {
    dedupe_matching(records, |file_type| file_type == FileType::Supplementary)
}

fn dedupe_matching(records: Vec<FileRecord>, applies: impl Fn(FileType) -> bool) -> Vec<FileRecord> {
    let mut seen: HashSet<(FileType, String)> = HashSet::new();

    records
        .into_iter()
        .filter(|record| {
            if !record.file_type.requires_entity() || !applies(record.file_type) {
                return true;
            }
            match &record.entity_id {
                None => {
                    debug!(
                        "Dropping {} {}: no owning entity",
                        record.file_type,
                        record.display_name()
                    );
                    false
                }
                Some(entity_id) => {
                    let fresh = seen.insert((record.file_type, entity_id.clone()));
                    if !fresh {
                        debug!(
                            "Dropping duplicate {} for {}: {}",
                            record.file_type,
                            entity_id,
                            record.display_name()
                        );
                    }
                    fresh
                }
            }
        })
        .collect()
}
