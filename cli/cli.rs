mod cli_args;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::process;

use cli_args::Cli;
use sourcepack_core::{AppError, ChangeType, Config, aggregate};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;
    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::DataLoading(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::WalkDir(_)) => 2,
                Some(AppError::Ignore(_)) => 2,
                Some(AppError::Glob(_)) => 2,
                Some(AppError::Chunking(_)) => 3,
                Some(AppError::Analysis(_)) => 4,
                Some(AppError::Cache(_)) => 4,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(_) => 1,
                None => 1,
            };

            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(cli.root_dir.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config_path =
        Config::resolve_config_path(&project_root, cli.config_file.as_ref(), cli.no_config)
            .context("Failed to resolve configuration path")?;
    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let config = merge_config_with_cli_overrides(config, &cli);

    let output = aggregate(&project_root, &config)
        .with_context(|| format!("Aggregation failed for {}", project_root.display()))?;

    if (config.tracking.enabled || config.tracking.incremental) && !quiet {
        print_change_summary(&output.changes);
    }

    match &cli.output_file {
        Some(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                project_root.join(path)
            };
            fs::write(&path, &output.document)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !quiet {
                println!(
                    "{} Aggregated {} files into {}",
                    "Done:".green().bold(),
                    output.file_count,
                    path.display().to_string().blue()
                );
            }
        }
        None => {
            println!("{}", output.document);
        }
    }

    Ok(())
}

fn merge_config_with_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    log::trace!("Applying CLI overrides to config...");

    if let Some(format) = &cli.format {
        config.output.format = format.clone();
    }
    if cli.no_extra_spacing {
        config.output.extra_spacing = false;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunking.chunk_size = chunk_size;
        config.chunking.byte_budget = None;
    }
    if let Some(chunk_bytes) = &cli.chunk_bytes {
        config.chunking.byte_budget = Some(chunk_bytes.clone());
    }
    if !cli.exclude.is_empty() {
        config.filter.exclude.extend(cli.exclude.iter().cloned());
    }
    if let Some(max_file_size) = cli.max_file_size {
        config.filter.max_file_size = max_file_size;
    }
    if cli.track_changes {
        config.tracking.enabled = true;
    }
    if cli.incremental {
        config.tracking.enabled = true;
        config.tracking.incremental = true;
    }

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

fn print_change_summary(changes: &[sourcepack_core::FileChange]) {
    if changes.is_empty() {
        eprintln!("{}", "No changes since the previous run.".dimmed());
        return;
    }
    eprintln!("{}", "Changes since the previous run:".bold());
    for change in changes {
        let line = format!("  {} {}", change.change_type.as_str(), change.file_path);
        let line = match change.change_type {
            ChangeType::Added => line.green(),
            ChangeType::Modified => line.yellow(),
            ChangeType::Removed => line.red(),
        };
        eprintln!("{}", line);
    }
}
