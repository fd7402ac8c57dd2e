use bundle_organizer_core::DataFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "bundle-organizer")]
#[command(about = "Organize and compress tabular export bundles", long_about = None)]
pub struct Cli {
    /// Log at debug level (overrides TRACING_LEVEL)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sort exports into one directory per entity and merge aggregate files
    Organize(OrganizeArgs),
    /// Merge every export of a record type into one file
    Compress(CompressArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Input directories to search (Config.toml / ORGANIZER_INPUTS when omitted)
    pub inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Accept files by name alone, without reading them
    #[arg(long)]
    pub skip_validation: bool,

    /// Show the plan without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Execute without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Copy files instead of moving them
    #[arg(long)]
    pub copy: bool,

    /// Leave legacy files in place instead of deleting them
    #[arg(long)]
    pub ignore_legacy: bool,

    /// Overwrite existing output even when it is newer
    #[arg(long)]
    pub ignore_duplicates: bool,
}

#[derive(Debug, Args)]
pub struct CompressArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Delete the source files once merged
    #[arg(long = "move")]
    pub move_files: bool,

    /// Format of the merged files
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Parquet,
}

impl From<FormatArg> for DataFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => DataFormat::Csv,
            FormatArg::Parquet => DataFormat::Parquet,
        }
    }
}
