pub mod classify;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod plan;
pub mod progress;
pub mod registry;
pub mod tabular;
pub mod validation;

pub use classify::DataFormat;
pub use config::AppConfig;
pub use discovery::{FileDiscovery, FileRecord, FileType};
pub use engine::{Mode, PipelineEngine, PreparedRun, RunResult};
pub use error::{Error, Exclusion};
pub use plan::{Plan, PlanReport, PlannedAction};
pub use progress::{ProgressReporter, SilentReporter};
pub use registry::RecordType;
