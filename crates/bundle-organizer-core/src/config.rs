use crate::classify::DataFormat;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub output: PathBuf,
    /// Move sources into the output instead of copying them.
    #[serde(default = "default_move_files")]
    pub move_files: bool,
    /// Leave legacy files where they are instead of deleting them.
    #[serde(default)]
    pub ignore_legacy: bool,
    /// Treat every source as newer than an existing destination.
    #[serde(default)]
    pub ignore_duplicates: bool,
    #[serde(default)]
    pub dry_run: bool,
    /// Accept any file whose name matches a record type without reading it.
    #[serde(default)]
    pub skip_validation: bool,
    /// Format of merged files written by `compress`.
    #[serde(default)]
    pub output_format: DataFormat,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_move_files() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::new(),
            move_files: default_move_files(),
            ignore_legacy: false,
            ignore_duplicates: false,
            dry_run: false,
            skip_validation: false,
            output_format: DataFormat::default(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// `Config.toml` (optional), then `ORGANIZER_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("ORGANIZER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("inputs")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for dir in dirs {
        if result.iter().any(|kept| dir.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&dir));
        result.push(dir);
    }

    result
}
