use std::path::Path;

/// Trait for reporting pipeline progress.
///
/// Called synchronously from the pipeline thread, so implementations must
/// return quickly. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_discovery_start(&self, _total_targets: usize) {}
    fn on_discovery_progress(&self, _current: usize, _total: usize, _path: &Path) {}
    fn on_discovery_complete(&self, _records: usize, _duration_secs: f64) {}
    fn on_plan_start(&self, _total_actions: usize, _dry_run: bool) {}
    fn on_action(&self, _index: usize, _total: usize, _description: &str) {}
    fn on_action_complete(&self, _index: usize, _total: usize) {}
    fn on_plan_complete(&self, _actions: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
