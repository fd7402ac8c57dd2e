use super::actions::PlannedAction;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::tabular::TabularAccess;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// An ordered list of actions, executed front to back at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<PlannedAction>,
}

/// What a plan run (or dry run) did.
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub descriptions: Vec<String>,
    pub executed: usize,
    pub duration: Duration,
}

impl Plan {
    pub fn new(actions: Vec<PlannedAction>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[PlannedAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Dry run: report every description, touch nothing.
    pub fn describe(&self, reporter: &dyn ProgressReporter) -> PlanReport {
        let start = Instant::now();
        let total = self.actions.len();
        reporter.on_plan_start(total, true);

        info!("Planned actions ({}):", total);
        let mut descriptions = Vec::with_capacity(total);
        for (index, action) in self.actions.iter().enumerate() {
            let description = action.describe();
            info!("  {}", description);
            reporter.on_action(index, total, &description);
            reporter.on_action_complete(index, total);
            descriptions.push(description);
        }

        let duration = start.elapsed();
        reporter.on_plan_complete(0, duration.as_secs_f64());
        PlanReport {
            descriptions,
            executed: 0,
            duration,
        }
    }

    /// Execute every action in order. The first failure aborts the run;
    /// actions before it stay applied.
    pub fn execute(
        self,
        tables: &dyn TabularAccess,
        reporter: &dyn ProgressReporter,
    ) -> Result<PlanReport, Error> {
        let start = Instant::now();
        let total = self.actions.len();
        reporter.on_plan_start(total, false);
        info!("Executing {} actions", total);

        let mut descriptions = Vec::with_capacity(total);
        for (index, action) in self.actions.into_iter().enumerate() {
            let description = action.describe();
            info!("{}", description);
            reporter.on_action(index, total, &description);

            if let Err(e) = action.execute(tables) {
                error!("Action {} of {} failed: {}", index + 1, total, e);
                return Err(Error::PlanExecution {
                    index,
                    description,
                    source: Box::new(e),
                });
            }

            reporter.on_action_complete(index, total);
            descriptions.push(description);
        }

        let duration = start.elapsed();
        info!(
            "Plan executed: {} actions in {:.2}s",
            total,
            duration.as_secs_f64()
        );
        reporter.on_plan_complete(total, duration.as_secs_f64());

        Ok(PlanReport {
            descriptions,
            executed: total,
            duration,
        })
    }
}

impl From<Vec<PlannedAction>> for Plan {
    fn from(actions: Vec<PlannedAction>) -> Self {
        Self::new(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::actions::Source;
    use crate::progress::SilentReporter;
    use crate::tabular::FrameTables;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn delete(path: &Path) -> PlannedAction {
        PlannedAction::DeleteFile {
            source: Source::plain(path),
        }
    }

    #[test]
    fn test_describe_touches_nothing() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("tags.csv");
        fs::write(&path, "tag\n").unwrap();

        let plan = Plan::new(vec![delete(&path)]);
        let report = plan.describe(&SilentReporter);

        assert_eq!(report.executed, 0);
        assert_eq!(report.descriptions, vec![format!("Deleting {}", path.display())]);
        assert!(path.exists());
    }

    #[test]
    fn test_failure_stops_the_run() {
        let tmp = tempdir().unwrap();
        let first = tmp.path().join("a.csv");
        let missing = tmp.path().join("missing.csv");
        let last = tmp.path().join("c.csv");
        fs::write(&first, "x").unwrap();
        fs::write(&last, "x").unwrap();

        let plan = Plan::new(vec![delete(&first), delete(&missing), delete(&last)]);
        let result = plan.execute(&FrameTables, &SilentReporter);

        match result {
            Err(Error::PlanExecution { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected PlanExecution, got {:?}", other),
        }
        assert!(!first.exists());
        assert!(last.exists());
    }
}
