mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use bundle_organizer_core::config::load_configuration;
use bundle_organizer_core::{AppConfig, Mode, PipelineEngine, RunResult};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, CompressArgs, OrganizeArgs, RunArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Organize(organize)) => {
            let yes = organize.run.yes;
            run_pipeline(organize_config(config, &organize), Mode::Organize, yes)
        }
        Some(Commands::Compress(compress)) => {
            let yes = compress.run.yes;
            run_pipeline(compress_config(config, &compress), Mode::Compress, yes)
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

/// Command line values take precedence over Config.toml and the environment.
fn apply_run_args(mut config: AppConfig, run: &RunArgs) -> AppConfig {
    if !run.inputs.is_empty() {
        config.inputs = run.inputs.clone();
    }
    if let Some(output) = &run.output {
        config.output = output.clone();
    }
    config.skip_validation |= run.skip_validation;
    config.dry_run |= run.dry_run;
    config
}

fn organize_config(config: AppConfig, args: &OrganizeArgs) -> AppConfig {
    let mut config = apply_run_args(config, &args.run);
    if args.copy {
        config.move_files = false;
    }
    config.ignore_legacy |= args.ignore_legacy;
    config.ignore_duplicates |= args.ignore_duplicates;
    config
}

fn compress_config(config: AppConfig, args: &CompressArgs) -> AppConfig {
    let mut config = apply_run_args(config, &args.run);
    // compress leaves its sources alone unless asked
    config.move_files = args.move_files;
    if let Some(format) = args.format {
        config.output_format = format.into();
    }
    config
}

fn run_pipeline(config: AppConfig, mode: Mode, yes: bool) -> anyhow::Result<()> {
    let dry_run = config.dry_run;
    let engine = PipelineEngine::new(config);
    let reporter = CliReporter::new();

    let prepared = engine
        .prepare(mode, &reporter)
        .with_context(|| format!("could not plan {}", mode))?;

    if prepared.plan().is_empty() {
        info!("Nothing to do");
        return Ok(());
    }

    if dry_run {
        let result = prepared.dry_run(&reporter);
        print_plan(&result.report.descriptions);
        print_summary(&result);
        return Ok(());
    }

    if !yes {
        print_plan(&prepared.describe());
        let prompt = format!("Execute {} actions?", prepared.plan().len());
        if !prompt_confirm(&prompt, Some(false))? {
            info!("Aborted, nothing was changed");
            return Ok(());
        }
    }

    let result = prepared.execute(&reporter)?;
    print_summary(&result);
    Ok(())
}

fn print_plan(descriptions: &[String]) {
    println!();
    for (index, description) in descriptions.iter().enumerate() {
        let line = if description.starts_with("Deleting") {
            description.red()
        } else if description.starts_with("Skipping") || description.starts_with("Ignoring") {
            description.dimmed()
        } else if description.starts_with("Merging") {
            description.cyan()
        } else {
            description.green()
        };
        println!("{:>4}. {}", index + 1, line);
    }
    println!();
}

fn print_summary(result: &RunResult) {
    let verb = if result.dry_run { "planned" } else { "executed" };
    info!(
        "{}: {} usable files found in {}, {} actions {}",
        result.mode,
        format!("{}", result.records_found).cyan(),
        format!("{:.2}s", result.discovery_duration.as_secs_f64()).green(),
        format!("{}", result.report.descriptions.len()).cyan(),
        verb,
    );
    if !result.dry_run {
        info!(
            "Plan: {}",
            format!("{:.2}s", result.report.duration.as_secs_f64()).green()
        );
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
