use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Aggregate a directory of source files into one annotated document.",
    long_about = "sourcepack walks a project directory, summarizes every source file \n(purpose, dependencies, structure), chunks oversized files, and renders \neverything into a single navigable document for humans or language models.",
    after_help = "EXAMPLES:\n  sourcepack --root-dir ./project -f markdown -o context.md\n  sourcepack -f html --chunk-size 200 > context.html\n  sourcepack --track-changes --incremental -o context.txt"
)]
pub struct Cli {
    #[arg(
        long,
        help = "Root directory to aggregate (default: current dir).",
        value_name = "PATH"
    )]
    pub root_dir: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        help = "Write the document to this file instead of stdout.",
        value_name = "FILE"
    )]
    pub output_file: Option<PathBuf>,

    #[arg(
        long,
        help = "Path/filename of the TOML config file (default: sourcepack.toml at the root).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file"
    )]
    pub no_config: bool,

    #[arg(
        short = 'f',
        long,
        help = "Set the output format.",
        value_name = "FORMAT",
        value_parser = ["plaintext", "markdown", "html"]
    )]
    pub format: Option<String>,

    #[arg(
        short = 'c',
        long,
        help = "Lines per chunk for oversized files (0 disables chunking).",
        value_name = "LINES"
    )]
    pub chunk_size: Option<usize>,

    #[arg(
        long,
        help = "Byte budget per chunk, e.g. '64KB' (overrides --chunk-size).",
        value_name = "SIZE"
    )]
    pub chunk_bytes: Option<String>,

    #[arg(
        short = 'e',
        long = "exclude",
        help = "Additional exclusion substring, matched anywhere in the path (repeatable).",
        value_name = "SUBSTRING"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long,
        help = "Skip files larger than this many bytes.",
        value_name = "BYTES"
    )]
    pub max_file_size: Option<u64>,

    #[arg(long, help = "Disable extra vertical spacing in the output.")]
    pub no_extra_spacing: bool,

    #[arg(long, help = "Track added/modified/removed files across runs.")]
    pub track_changes: bool,

    #[arg(
        long,
        help = "Skip files unchanged since the last run (implies --track-changes)."
    )]
    pub incremental: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}
