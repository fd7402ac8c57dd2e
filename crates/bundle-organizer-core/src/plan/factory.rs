use super::actions::{PlannedAction, Source};
use crate::classify::{identify_format, DataFormat};
use crate::config::AppConfig;
use crate::discovery::{FileRecord, FileType};
use crate::registry::{RecordType, ENTITY_COLUMN};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SUPPLEMENTARY_OUTPUT: &str = "supplementary";

/// The slice of [`AppConfig`] that shapes a plan.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub output: PathBuf,
    pub move_files: bool,
    pub ignore_legacy: bool,
    pub ignore_duplicates: bool,
    pub output_format: DataFormat,
}

impl From<&AppConfig> for PlanOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            output: config.output.clone(),
            move_files: config.move_files,
            ignore_legacy: config.ignore_legacy,
            ignore_duplicates: config.ignore_duplicates,
            output_format: config.output_format,
        }
    }
}

/// Turns discovered records into planned actions.
pub struct ActionFactory {
    options: PlanOptions,
}

impl ActionFactory {
    pub fn new(options: PlanOptions) -> Self {
        Self { options }
    }

    /// One directory per entity, one merged file per aggregate type.
    pub fn organize(&self, records: Vec<FileRecord>) -> Vec<PlannedAction> {
        let mut actions = Vec::new();
        let mut manifests = Vec::new();
        let mut classes = Vec::new();

        for record in records {
            match record.file_type {
                FileType::Record(record_type) if record_type.is_legacy() => {
                    actions.push(self.legacy(&record));
                }
                FileType::Record(RecordType::Manifest) => manifests.push(record),
                FileType::Record(RecordType::Classes) => classes.push(record),
                _ => {
                    let Some(entity) = record.entity_id.as_deref() else {
                        warn!(
                            "Skipping {} {}: no entity id",
                            record.file_type,
                            record.display_name()
                        );
                        continue;
                    };
                    let Some(file_name) = record.file_name() else {
                        continue;
                    };
                    let destination = self.options.output.join(entity).join(file_name);
                    actions.extend(self.transfer(Source::from(&record), destination));
                }
            }
        }

        actions.extend(self.aggregate(RecordType::Manifest, manifests));
        actions.extend(self.aggregate(RecordType::Classes, classes));
        actions
    }

    /// One merged file per record type, supplementary directories grouped
    /// under `<output>/supplementary/<entity>`.
    pub fn compress(&self, records: Vec<FileRecord>) -> Vec<PlannedAction> {
        // first-seen type order
        let mut by_type: Vec<(FileType, Vec<FileRecord>)> = Vec::new();
        for record in records {
            match by_type.iter_mut().find(|(file_type, _)| *file_type == record.file_type) {
                Some((_, group)) => group.push(record),
                None => by_type.push((record.file_type, vec![record])),
            }
        }

        let counts: Vec<String> = by_type
            .iter()
            .map(|(file_type, group)| format!("{}: {}", file_type, group.len()))
            .collect();
        info!("Found files to compress: {{{}}}", counts.join(", "));

        let mut actions = Vec::new();
        for (file_type, group) in by_type {
            match file_type {
                FileType::Supplementary => {
                    let root = self.options.output.join(SUPPLEMENTARY_OUTPUT);
                    for record in group {
                        let (Some(entity), Some(file_name)) =
                            (record.entity_id.as_deref(), record.file_name())
                        else {
                            warn!("Skipping {}: no entity id", record.display_name());
                            continue;
                        };
                        let destination = root.join(entity).join(file_name);
                        actions.extend(self.transfer(Source::from(&record), destination));
                    }
                }
                FileType::Record(record_type) if record_type.is_legacy() => {
                    actions.extend(group.iter().map(|record| self.legacy(record)));
                }
                FileType::Record(record_type) => {
                    let destination = self.options.output.join(format!(
                        "{}.{}",
                        record_type.tag(),
                        self.options.output_format.extension()
                    ));
                    let sources: Vec<Source> = group.iter().map(Source::from).collect();
                    let consumed: Vec<Source> = sources
                        .iter()
                        .filter(|source| !is_same_path(&source.path, &destination))
                        .cloned()
                        .collect();
                    actions.push(PlannedAction::MergeFiles {
                        record_type,
                        sources,
                        destination,
                        unique_by: record_type
                            .unique_keys()
                            .iter()
                            .map(|key| key.to_string())
                            .collect(),
                        format: self.options.output_format,
                    });
                    if self.options.move_files {
                        actions.extend(
                            consumed
                                .into_iter()
                                .map(|source| PlannedAction::DeleteFile { source }),
                        );
                    }
                }
            }
        }

        actions
    }

    fn legacy(&self, record: &FileRecord) -> PlannedAction {
        let source = Source::from(record);
        if self.options.ignore_legacy {
            PlannedAction::IgnoreFile { source }
        } else {
            PlannedAction::DeleteFile { source }
        }
    }

    /// Move or copy `source` to `destination`. Nothing to do when the
    /// source already is the destination.
    fn transfer(&self, source: Source, destination: PathBuf) -> Option<PlannedAction> {
        if is_same_path(&source.path, &destination) {
            debug!("{} is already in place", source.name);
            return None;
        }

        let ignore_duplicates = self.options.ignore_duplicates;
        Some(if self.options.move_files {
            PlannedAction::MoveFile {
                source,
                destination,
                ignore_duplicates,
            }
        } else {
            PlannedAction::CopyFile {
                source,
                destination,
                ignore_duplicates,
            }
        })
    }

    /// Fold every source of an aggregate type into `<output>/<tag>.<ext>`.
    /// An existing output joins the merge after the inputs, so rows from
    /// the inputs win on a shared `class_id`.
    fn aggregate(&self, record_type: RecordType, group: Vec<FileRecord>) -> Vec<PlannedAction> {
        let Some(first) = group.first() else {
            return Vec::new();
        };

        let format = identify_format(&first.path).unwrap_or_default();
        let destination = self
            .options
            .output
            .join(format!("{}.{}", record_type.tag(), format.extension()));

        let inputs: Vec<Source> = group
            .iter()
            .filter(|record| !is_same_path(&record.path, &destination))
            .map(Source::from)
            .collect();
        if inputs.is_empty() {
            debug!("{} is already in place", destination.display());
            return Vec::new();
        }

        let mut sources = inputs.clone();
        if destination.exists() {
            sources.push(Source::plain(&destination));
        }

        if sources.len() == 1 {
            return self
                .transfer(sources.remove(0), destination)
                .into_iter()
                .collect();
        }

        let mut actions = vec![PlannedAction::MergeFiles {
            record_type,
            sources,
            destination,
            unique_by: vec![ENTITY_COLUMN.to_string()],
            format,
        }];
        if self.options.move_files {
            actions.extend(
                inputs
                    .into_iter()
                    .map(|source| PlannedAction::DeleteFile { source }),
            );
        }
        actions
    }
}

fn is_same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
