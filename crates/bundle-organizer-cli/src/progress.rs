use bundle_organizer_core::ProgressReporter;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Progress bars for the two long phases: discovery (one tick per
/// enumerated entry or archive) and plan execution (one tick per action).
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar(total: usize, label: &str) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        let template = format!(
            "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} {{wide_msg}}",
            label
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS);
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_discovery_start(&self, total_targets: usize) {
        self.set_bar(Self::bar(total_targets, "Discovering"));
    }

    fn on_discovery_progress(&self, current: usize, _total: usize, path: &Path) {
        self.with_bar(|pb| {
            pb.set_position(current as u64);
            if let Some(name) = path.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }
        });
    }

    fn on_discovery_complete(&self, records: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Discovery complete: {} usable files in {:.2}s",
            "✓".green(),
            records,
            duration_secs
        );
    }

    fn on_plan_start(&self, total_actions: usize, dry_run: bool) {
        // descriptions are printed by the caller on a dry run
        if !dry_run {
            self.set_bar(Self::bar(total_actions, "Executing"));
        }
    }

    fn on_action(&self, _index: usize, _total: usize, description: &str) {
        self.with_bar(|pb| pb.set_message(description.to_string()));
    }

    fn on_action_complete(&self, index: usize, _total: usize) {
        self.with_bar(|pb| pb.set_position(index as u64 + 1));
    }

    fn on_plan_complete(&self, actions: usize, duration_secs: f64) {
        self.finish_bar();
        if actions > 0 {
            eprintln!(
                "  {} Plan complete: {} actions in {:.2}s",
                "✓".green(),
                actions,
                duration_secs
            );
        }
    }
}
