//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::control;
use serde_json::{Value, json};
use thiserror::Error;

use channel_reflection_grader::core::config::Config;
use channel_reflection_grader::core::errors::CrgError;
use channel_reflection_grader::ingest::ingest_archive;
use channel_reflection_grader::logger::diagnostics::{Diagnostics, Severity};
use channel_reflection_grader::logger::jsonl::{JsonlConfig, JsonlWriter};
use channel_reflection_grader::report;

/// Channel reflection grader — scores chat-channel export archives.
#[derive(Debug, Parser)]
#[command(
    name = "crg",
    author,
    version,
    about = "Channel Reflection Grader - grades chat export archives",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Aggregate an export archive and print the channel table.
    Analyze(AnalyzeArgs),
    /// Aggregate an export archive and write the HTML report.
    Report(ReportArgs),
    /// Show one channel in detail, including retained raw logs.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct AnalyzeArgs {
    /// Path to the export archive (zip).
    archive: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ReportArgs {
    /// Path to the export archive (zip).
    archive: PathBuf,
    /// Output file for the HTML report.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct InspectArgs {
    /// Path to the export archive (zip).
    archive: PathBuf,
    /// Channel name to inspect.
    channel: String,
}

#[derive(Debug, Clone, Args)]
struct VersionArgs {}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Grader failure (archive, config, pool).
    #[error("{0}")]
    Core(#[from] CrgError),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Core(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Analyze(args) => run_analyze(cli, args),
        Command::Report(args) => run_report(cli, args),
        Command::Inspect(args) => run_inspect(cli, args),
        Command::Version(VersionArgs {}) => emit_version(cli),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn run_analyze(cli: &Cli, args: &AnalyzeArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let diagnostics = build_diagnostics(&config);
    let outcome = ingest_archive(&args.archive, &config.ingest, &diagnostics)?;
    diagnostics.flush();

    if cli.json {
        return write_json_line(&report::to_json(&outcome, &diagnostics.snapshot()));
    }

    let summaries = report::summaries(&outcome);
    print!(
        "{}",
        report::table::render(&summaries, config.report.top_users)
    );
    print_warning_summary(cli, &diagnostics);
    Ok(())
}

fn run_report(cli: &Cli, args: &ReportArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let diagnostics = build_diagnostics(&config);
    let outcome = ingest_archive(&args.archive, &config.ingest, &diagnostics)?;
    diagnostics.flush();

    let page = report::html::render(&outcome, &diagnostics.snapshot(), &config.report);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.paths.report_file.clone());
    std::fs::write(&output, page).map_err(|source| CrgError::io(&output, source))?;

    if cli.json {
        return write_json_line(&json!({
            "report": output,
            "stats": outcome.stats,
        }));
    }
    if !cli.quiet {
        println!("Report written to {}", output.display());
    }
    print_warning_summary(cli, &diagnostics);
    Ok(())
}

fn run_inspect(cli: &Cli, args: &InspectArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let diagnostics = build_diagnostics(&config);
    let outcome = ingest_archive(&args.archive, &config.ingest, &diagnostics)?;
    diagnostics.flush();

    let channel = match outcome.channel(&args.channel) {
        Ok(channel) => channel,
        Err(CrgError::UnknownChannel { name }) => {
            let known = outcome
                .channels
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CliError::User(format!(
                "unknown channel {name:?}; archive has: {known}"
            )));
        }
        Err(error) => return Err(error.into()),
    };

    if cli.json {
        return write_json_line(&serde_json::to_value(channel)?);
    }

    println!("Channel:     {}", channel.name);
    println!("Messages:    {}", channel.message_count);
    println!("Merged:      {}", channel.merged_count);
    println!("Closed:      {}", channel.closed_count);
    println!("Reflections: {}", channel.reflection_count);
    println!("Grade:       {:.2}", channel.grade);
    println!();
    println!("Per-user tallies:");
    if channel.user_counts.is_empty() {
        println!("  (none)");
    }
    for (user, count) in &channel.user_counts {
        println!("  {user:<24} {count:>6}");
    }
    println!();
    for log in &channel.logs {
        println!("File: {}", log.entry_name);
        let pretty = serde_json::to_string_pretty(&log.messages)?;
        println!("{pretty}");
    }
    Ok(())
}

fn emit_version(cli: &Cli) -> Result<(), CliError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    if cli.json {
        return write_json_line(&json!({"name": name, "version": version}));
    }
    println!("{name} {version}");
    Ok(())
}

// ──────────────────────── shared plumbing ────────────────────────

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    if cli.verbose && let Ok(hash) = config.stable_hash() {
        eprintln!("crg: config {hash}");
    }
    Ok(config)
}

fn build_diagnostics(config: &Config) -> Diagnostics {
    if config.diagnostics.jsonl_enabled {
        let writer = JsonlWriter::open(JsonlConfig {
            path: config.paths.jsonl_log.clone(),
            ..JsonlConfig::default()
        });
        Diagnostics::with_writer(writer)
    } else {
        Diagnostics::new()
    }
}

fn print_warning_summary(cli: &Cli, diagnostics: &Diagnostics) {
    if cli.quiet {
        return;
    }
    for diagnostic in diagnostics.snapshot() {
        match diagnostic.severity {
            Severity::Warning => {
                let entry = diagnostic.entry.as_deref().unwrap_or("-");
                eprintln!("crg: warning: {} ({entry})", diagnostic.details);
            }
            Severity::Info if cli.verbose => {
                eprintln!("crg: {}", diagnostic.details);
            }
            Severity::Info => {}
        }
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}
