use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use actionpin::output::{write_human, write_json};
use actionpin::{DEFAULT_WORKFLOW_DIR, FileConfig, FsSourceConfig, ScanReport, scan_fs};

use crate::logging;

#[derive(Parser, Debug)]
#[command(name = "actionpin", version, about = "Audit reusable action references in CI workflows")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every action reference in workflow files
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Files or directories to scan [default: .github/workflows]
    paths: Vec<PathBuf>,

    /// Glob pattern of files to skip (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// Only list references not pinned to a commit digest, and fail if any exist
    #[arg(long)]
    unpinned_only: bool,

    /// Config file [default: .actionpin.yaml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum size of a single workflow file in bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Follow symbolic links while walking directories
    #[arg(long)]
    follow_links: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

/// Parse arguments, run the command and return the process exit code.
///
/// # Errors
///
/// Returns an error if the config file is invalid or a scan path is missing.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Scan(args) => scan(args),
    }
}

fn scan(args: ScanArgs) -> anyhow::Result<i32> {
    let file_config = FileConfig::load(args.config.as_deref())?;
    let config = build_config(&args, &file_config);
    let report = scan_fs(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Json => write_json(&report, &mut out)?,
        Format::Human => {
            write_human(&report, &mut out, args.unpinned_only)?;
            writeln!(out, "{}", status_line(&report, args.unpinned_only))?;
        }
    }

    Ok(exit_code(&report, args.unpinned_only))
}

fn build_config(args: &ScanArgs, file_config: &FileConfig) -> FsSourceConfig {
    let mut config = FsSourceConfig::default().with_file_config(file_config);
    config.paths = if args.paths.is_empty() {
        vec![PathBuf::from(DEFAULT_WORKFLOW_DIR)]
    } else {
        args.paths.clone()
    };
    config.exclude.extend(args.exclude.iter().cloned());
    if let Some(max) = args.max_file_size {
        config.max_file_size = max;
    }
    if args.follow_links {
        config.follow_links = true;
    }
    config
}

fn exit_code(report: &ScanReport, unpinned_only: bool) -> i32 {
    let failed = !report.is_complete() || (unpinned_only && report.unpinned_count() > 0);
    i32::from(failed)
}

fn status_line(report: &ScanReport, unpinned_only: bool) -> String {
    if !report.is_complete() {
        return format!(
            "\u{2717} {} file(s) could not be scanned",
            report.failed_files
        )
        .red()
        .to_string();
    }
    if unpinned_only && report.unpinned_count() > 0 {
        return format!(
            "\u{2717} {} reference(s) not pinned to a commit",
            report.unpinned_count()
        )
        .yellow()
        .to_string();
    }
    format!("\u{2713} {} file(s) scanned", report.scanned_files)
        .green()
        .to_string()
}
