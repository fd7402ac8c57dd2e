use crate::config::AppConfig;
use crate::discovery::{FileDiscovery, FileRecord};
use crate::error::Error;
use crate::plan::{ActionFactory, Plan, PlanOptions, PlanReport};
use crate::progress::ProgressReporter;
use crate::tabular::{FrameTables, TabularAccess};
use crate::validation::ValidationStrategies;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{info, warn};

/// Which output layout to plan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `<output>/<entity>/<file>` plus one merged file per aggregate type.
    Organize,
    /// One merged file per record type.
    Compress,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Organize => f.write_str("organize"),
            Mode::Compress => f.write_str("compress"),
        }
    }
}

pub struct PipelineEngine {
    config: AppConfig,
    tables: Arc<dyn TabularAccess>,
}

#[derive(Debug)]
pub struct RunResult {
    pub mode: Mode,
    pub dry_run: bool,
    pub records_found: usize,
    pub discovery_duration: Duration,
    pub report: PlanReport,
}

/// Discovery and planning done, nothing executed yet.
///
/// Owns the staging directory that extracted archive members live in; it
/// is removed when this value is dropped, whether or not the plan ran.
pub struct PreparedRun {
    mode: Mode,
    plan: Plan,
    records: Vec<FileRecord>,
    discovery_duration: Duration,
    tables: Arc<dyn TabularAccess>,
    staging: TempDir,
}

impl PipelineEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            tables: Arc::new(FrameTables::new()),
        }
    }

    pub fn with_tables(mut self, tables: Arc<dyn TabularAccess>) -> Self {
        self.tables = tables;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the pipeline up to a plan:
    /// 1. Discover, classify and validate candidates (archives into staging)
    /// 2. Plan actions for the chosen layout
    pub fn prepare(&self, mode: Mode, reporter: &dyn ProgressReporter) -> Result<PreparedRun, Error> {
        if self.config.inputs.is_empty() {
            return Err(Error::Other("no input directories given".to_string()));
        }
        if self.config.output.as_os_str().is_empty() {
            return Err(Error::Other("no output directory given".to_string()));
        }

        let staging = tempfile::Builder::new()
            .prefix("bundle-organizer-")
            .tempdir()?;

        let strategies = if self.config.skip_validation {
            if mode == Mode::Organize {
                warn!("Validation skipped: per-entity files have no owner and will be left in place");
            }
            ValidationStrategies::trust_filename()
        } else {
            ValidationStrategies::standard(Arc::clone(&self.tables))
        };

        // Phase 1: discovery
        info!("Discovering files...");
        let discovery_start = Instant::now();
        let mut discovery = FileDiscovery::new(self.config.inputs.clone(), strategies, staging.path())
            .with_ignore_patterns(self.config.ignore_patterns.clone());
        if mode == Mode::Compress {
            discovery = discovery.keep_duplicates();
        }
        let records = discovery.discover(reporter)?;
        let discovery_duration = discovery_start.elapsed();

        // Phase 2: planning
        info!("Planning {} of {} records...", mode, records.len());
        let factory = ActionFactory::new(PlanOptions::from(&self.config));
        let actions = match mode {
            Mode::Organize => factory.organize(records.clone()),
            Mode::Compress => factory.compress(records.clone()),
        };
        info!("Planned {} actions", actions.len());

        Ok(PreparedRun {
            mode,
            plan: Plan::new(actions),
            records,
            discovery_duration,
            tables: Arc::clone(&self.tables),
            staging,
        })
    }

    /// Prepare, then describe (dry run) or execute.
    pub fn run(&self, mode: Mode, reporter: &dyn ProgressReporter) -> Result<RunResult, Error> {
        let prepared = self.prepare(mode, reporter)?;
        if self.config.dry_run {
            Ok(prepared.dry_run(reporter))
        } else {
            prepared.execute(reporter)
        }
    }
}

impl PreparedRun {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    pub fn describe(&self) -> Vec<String> {
        self.plan.actions().iter().map(|action| action.describe()).collect()
    }

    pub fn dry_run(self, reporter: &dyn ProgressReporter) -> RunResult {
        let report = self.plan.describe(reporter);
        RunResult {
            mode: self.mode,
            dry_run: true,
            records_found: self.records.len(),
            discovery_duration: self.discovery_duration,
            report,
        }
    }

    pub fn execute(self, reporter: &dyn ProgressReporter) -> Result<RunResult, Error> {
        let PreparedRun {
            mode,
            plan,
            records,
            discovery_duration,
            tables,
            staging,
        } = self;

        let report = plan.execute(tables.as_ref(), reporter)?;
        drop(staging);

        Ok(RunResult {
            mode,
            dry_run: false,
            records_found: records.len(),
            discovery_duration,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_prepare_requires_inputs() {
        let engine = PipelineEngine::new(AppConfig::default());
        let result = engine.prepare(Mode::Organize, &SilentReporter);
        assert!(matches!(result, Err(Error::Other(_))));
    }

    #[test]
    fn test_staging_removed_after_prepared_run_dropped() {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("in");
        fs::create_dir_all(&input).unwrap();
        let config = AppConfig {
            inputs: vec![input],
            output: tmp.path().join("out"),
            ..AppConfig::default()
        };

        let prepared = PipelineEngine::new(config)
            .prepare(Mode::Organize, &SilentReporter)
            .unwrap();
        let staging = prepared.staging_path().to_path_buf();
        assert!(staging.is_dir());
        assert!(prepared.plan().is_empty());

        drop(prepared);
        assert!(!staging.exists());
    }
}
